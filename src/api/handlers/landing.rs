use axum::http::header;
use axum::response::{IntoResponse, Response};

/// GET / — minimal static page exercising the anonymous upload API.
pub async fn landing() -> Response {
    const PAGE: &str = "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
        <meta charset=\"UTF-8\" />\n\
        <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" />\n\
        <title>blobgate</title>\n</head>\n<body>\n\
        <h1>blobgate</h1>\n\
        <p>POST a file body to <code>/anonUpload</code> with content-type and\n\
        content-length set to receive a retrieval URL.</p>\n\
        <input type=\"file\" id=\"file\" />\n\
        <pre id=\"result\"></pre>\n\
        <script>\n\
        document.getElementById('file').addEventListener('change', async (e) => {\n\
          const file = e.target.files[0];\n\
          if (!file) return;\n\
          const res = await fetch('/anonUpload?filename=' + encodeURIComponent(file.name), {\n\
            method: 'POST',\n\
            headers: { 'content-type': file.type || 'application/octet-stream' },\n\
            body: file,\n\
          });\n\
          document.getElementById('result').textContent = await res.text();\n\
        });\n\
        </script>\n</body>\n</html>\n";

    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], PAGE).into_response()
}
