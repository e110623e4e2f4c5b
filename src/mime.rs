//! MIME type lookup
//!
//! Static extension to MIME type table used to label transferred payloads.

/// Resolves file extensions to MIME type strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct MimeTypeResolver;

impl MimeTypeResolver {
    /// Returns the MIME type for `extension`, or an empty string when unknown.
    pub fn resolve(&self, extension: &str) -> &'static str {
        mime_type_for(extension)
    }
}

/// Returns the MIME type for `extension` (without the leading dot).
///
/// Matching ignores ASCII case. Unknown extensions yield `""`.
pub fn mime_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "apk" => "application/vnd.android.package-archive",
        "avi" => "video/x-msvideo",
        "bin" | "class" | "exe" => "application/octet-stream",
        "bmp" => "image/bmp",
        "css" => "text/css",
        "dir" => "application/x-director",
        "dll" => "application/x-msdownload",
        "doc" | "docx" => "application/msword",
        "gif" => "image/gif",
        "gtar" => "application/x-gtar",
        "gz" => "application/x-gzip",
        "htm" | "html" => "text/html",
        "ico" => "image/x-icon",
        "jpe" | "jpeg" | "jpg" => "image/jpeg",
        "js" => "application/x-javascript",
        "m3u" => "audio/x-mpegurl",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "mpeg" => "video/mpeg",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "ppt" => "application/vnd.ms-powerpoint",
        "rar" => "application/x-rar-compressed",
        "svg" => "image/svg+xml",
        "swf" => "application/x-shockwave-flash",
        "tar" => "application/x-tar",
        "tgz" => "application/x-compressed",
        "tif" | "tiff" => "image/tiff",
        "txt" => "text/plain",
        "wav" => "audio/x-wav",
        "wps" => "application/vnd.ms-works",
        "xls" | "xlsx" => "application/vnd.ms-excel",
        "zip" => "application/zip",
        _ => "",
    }
}

/// Returns everything after the last `.` in `filename`.
///
/// A name without a dot is returned whole.
pub fn file_type_of(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) => &filename[idx + 1..],
        None => filename,
    }
}
