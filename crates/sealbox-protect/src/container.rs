//! Self-decrypting container for formats without native password support.
//!
//! Arbitrary bytes are sealed with the core AES-256-CBC primitives and
//! embedded in a standalone HTML document that prompts for the password,
//! re-derives the key client side (SHA-256, WebCrypto AES-CBC), and saves
//! the reconstructed file under its original name. No server round-trip
//! is needed once the container has been obtained.
//!
//! Known limitation, preserved deliberately: the cleartext password is
//! embedded in the container for the client-side comparison, so this is a
//! convenience gate against casual viewing, not a confidentiality
//! boundary against anyone who reads the container source. Hardening it
//! would break the self-sufficiency contract.

use sealbox_core::crypto;

use crate::error::Result;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Protected file</title>
<style>
  body { font-family: system-ui, sans-serif; display: flex; justify-content: center; margin-top: 15vh; }
  .card { border: 1px solid #ccc; border-radius: 8px; padding: 2rem; max-width: 24rem; }
  .error { color: #b00; min-height: 1.2em; }
  input, button { font-size: 1rem; padding: 0.4rem; }
</style>
</head>
<body>
<div class="card">
  <h1>Protected file</h1>
  <p>This file is password protected. Enter the password to save
     <strong id="name"></strong>.</p>
  <form id="form">
    <input id="password" type="password" autocomplete="off" autofocus>
    <button type="submit">Unlock</button>
  </form>
  <p class="error" id="error"></p>
</div>
<script>
const PAYLOAD = __SEALBOX_PAYLOAD__;
const PASSWORD = __SEALBOX_PASSWORD__;
const FILENAME = __SEALBOX_FILENAME__;
const CONTENT_TYPE = __SEALBOX_CONTENT_TYPE__;

document.getElementById("name").textContent = FILENAME;

document.getElementById("form").addEventListener("submit", async (ev) => {
  ev.preventDefault();
  const supplied = document.getElementById("password").value;
  const error = document.getElementById("error");
  if (supplied !== PASSWORD) {
    error.textContent = "Invalid password.";
    return;
  }
  error.textContent = "";

  const raw = atob(PAYLOAD);
  const framed = new Uint8Array(raw.length);
  for (let i = 0; i < raw.length; i++) framed[i] = raw.charCodeAt(i);
  const iv = framed.slice(0, 16);
  const ciphertext = framed.slice(16);

  const keyBytes = await crypto.subtle.digest(
    "SHA-256", new TextEncoder().encode(supplied));
  const key = await crypto.subtle.importKey(
    "raw", keyBytes, { name: "AES-CBC" }, false, ["decrypt"]);
  const plain = await crypto.subtle.decrypt(
    { name: "AES-CBC", iv }, key, ciphertext);

  const blob = new Blob([plain], { type: CONTENT_TYPE });
  const a = document.createElement("a");
  a.href = URL.createObjectURL(blob);
  a.download = FILENAME;
  a.click();
  URL.revokeObjectURL(a.href);
});
</script>
</body>
</html>
"#;

/// Wrap bytes in a self-decrypting container document.
pub fn wrap(
    bytes: &[u8],
    password: &str,
    original_filename: &str,
    content_type: &str,
) -> Result<String> {
    let payload = crypto::seal(bytes, password);

    // serde_json string encoding doubles as JS string-literal escaping.
    let html = TEMPLATE
        .replace("__SEALBOX_PAYLOAD__", &js_string(&payload))
        .replace("__SEALBOX_PASSWORD__", &js_string(password))
        .replace("__SEALBOX_FILENAME__", &js_string(original_filename))
        .replace("__SEALBOX_CONTENT_TYPE__", &js_string(content_type));

    Ok(html)
}

/// Extract the embedded sealed payload from a container document.
///
/// The server never needs this to serve downloads; it exists so tests and
/// tooling can check the round-trip property without a browser.
pub fn embedded_payload(html: &str) -> Option<String> {
    let start = html.find("const PAYLOAD = \"")? + "const PAYLOAD = \"".len();
    let end = html[start..].find('"')? + start;
    Some(html[start..end].to_string())
}

fn js_string(s: &str) -> String {
    serde_json::to_string(s).expect("string serialization cannot fail")
}
