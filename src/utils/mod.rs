use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::Path;

lazy_static! {
    static ref LATEX_RE: Regex = Regex::new(r"\$\$([^$]+)\$\$|\$([^$]+)\$").unwrap();
}

/// Read an image from disk and wrap it in a data URI
pub fn encode_image_to_base64(path: &Path) -> Result<String, std::io::Error> {
    let image_data = fs::read(path)?;
    Ok(format!(
        "data:{};base64,{}",
        mime_for(path),
        general_purpose::STANDARD.encode(image_data)
    ))
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

/// Extract `$...$` and `$$...$$` fragments in order of appearance
pub fn extract_latex(text: &str) -> Vec<String> {
    LATEX_RE
        .captures_iter(text)
        .filter_map(|cap| cap.get(1).or_else(|| cap.get(2)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|f| !f.is_empty())
        .collect()
}
