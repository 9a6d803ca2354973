use axum::response::Html;

const UPLOAD_PAGE: &str = r#"<!doctype html>
<html><head><meta charset=utf-8><title>Backbrain Upload</title>
<style>
body{font-family:system-ui;padding:24px}
#drop{border:2px dashed #888;padding:40px;text-align:center;border-radius:12px}
#drop.drag{border-color:#000}
</style></head>
<body>
<h1>Drag &amp; Drop Upload</h1>
<p>Dateien hierher ziehen. <code>kind</code> = <b>entries</b> oder <b>summaries</b>.</p>
<label>Kind: <select id="kind"><option>entries</option><option>summaries</option></select></label>
<label>Secret: <input id="secret" type="password" placeholder="optional"></label>
<div id="drop">Dateien hier ablegen</div>
<pre id="out"></pre>
<script>
const drop=document.getElementById('drop'), out=document.getElementById('out');
const kindSel=document.getElementById('kind'), secret=document.getElementById('secret');
['dragenter','dragover'].forEach(e=>drop.addEventListener(e,ev=>{ev.preventDefault();drop.classList.add('drag')}));
['dragleave','drop'].forEach(e=>drop.addEventListener(e,ev=>{ev.preventDefault();drop.classList.remove('drag')}));
drop.addEventListener('drop', async ev=>{
  out.textContent='';
  for(const f of [...ev.dataTransfer.files]){
    const fd=new FormData(); fd.append('kind', kindSel.value); fd.append('file', f);
    const headers=secret.value?{'X-Api-Secret':secret.value}:{};
    const res=await fetch('/upload',{method:'POST',body:fd,headers});
    out.textContent+=(await res.text())+'\n';
  }
});
</script></body></html>"#;

/// Minimal drag-and-drop page posting to `/upload`
pub async fn upload_page() -> Html<&'static str> {
    Html(UPLOAD_PAGE)
}
