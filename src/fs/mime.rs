//! MIME type helpers: export format choice and extension inference.

/// Drive folder MIME type.
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

pub const GOOGLE_DOCUMENT: &str = "application/vnd.google-apps.document";
pub const GOOGLE_SPREADSHEET: &str = "application/vnd.google-apps.spreadsheet";
pub const GOOGLE_PRESENTATION: &str = "application/vnd.google-apps.presentation";
pub const GOOGLE_DRAWING: &str = "application/vnd.google-apps.drawing";

pub const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const PPTX: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const PDF: &str = "application/pdf";

/// Pick the export format for a document that has no binary content.
///
/// Preference: Office Open XML, then OpenDocument, then PDF, then any image,
/// then whatever comes first. Without any export choice the native type is
/// mapped to its usual Office counterpart (drawings become PDF), and any
/// other type is returned as is.
pub fn choose_mime_type<S: AsRef<str>>(choices: &[S], document_type: &str) -> String {
    let find = |pred: fn(&str) -> bool| {
        choices.iter().map(|c| c.as_ref()).find(|choice| pred(choice))
    };

    let chosen: Option<&str> = find(|t| t.contains("vnd.openxmlformats-officedocument"))
        .or_else(|| find(|t| t.contains("vnd.oasis.opendocument")))
        .or_else(|| find(|t| t.contains(PDF)))
        .or_else(|| find(|t| t.starts_with("image/")))
        .or_else(|| choices.first().map(|c| c.as_ref()));

    if let Some(mime) = chosen {
        return mime.to_string();
    }

    match document_type {
        GOOGLE_DOCUMENT => DOCX,
        GOOGLE_SPREADSHEET => XLSX,
        GOOGLE_PRESENTATION => PPTX,
        GOOGLE_DRAWING => PDF,
        other => other,
    }
    .to_string()
}

/// Canonical extension for types where `mime_guess`'s first (alphabetical)
/// entry is not the usual one, e.g. `.jfif` for JPEG or `.aaf` for
/// `application/octet-stream`.
fn preferred_extension(mime: &str) -> Option<&'static str> {
    let ext = match mime {
        // images
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/tiff" => "tiff",
        "image/bmp" => "bmp",
        "image/heic" => "heic",
        "image/vnd.djvu" => "djvu",
        "image/x-icon" => "ico",
        // audio and video
        "audio/mpeg" => "mp3",
        "audio/mp4" => "m4a",
        "audio/x-m4a" => "m4a",
        "audio/aac" => "aac",
        "audio/ogg" => "ogg",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/aiff" => "aiff",
        "audio/mid" => "mid",
        "audio/x-mpegurl" => "m3u",
        "video/mp4" => "mp4",
        "video/mpeg" => "mpg",
        "video/quicktime" => "mov",
        "video/x-matroska" => "mkv",
        "video/webm" => "webm",
        "video/3gpp" => "3gp",
        "video/3gpp2" => "3g2",
        "video/x-ms-asf" => "asf",
        "video/vnd.dlna.mpeg-tts" => "ts",
        // text
        "text/plain" => "txt",
        "text/csv" => "csv",
        "text/html" => "html",
        "text/markdown" | "text/x-markdown" => "md",
        "text/javascript" => "js",
        "text/calendar" => "ics",
        "text/xml" | "application/xml" => "xml",
        "text/x-yaml" => "yaml",
        "text/x-fortran" => "f90",
        "text/x-pascal" => "pas",
        "text/sgml" => "sgml",
        "text/tab-separated-values" => "tsv",
        "message/rfc822" => "eml",
        // archives and binaries
        "application/octet-stream" => "bin",
        "application/zip" => "zip",
        "application/x-bzip2" => "bz2",
        "application/java-archive" => "jar",
        "application/x-msdownload" => "exe",
        "application/postscript" => "ps",
        "application/x-x509-ca-cert" => "crt",
        "application/pgp-signature" => "sig",
        "application/xhtml+xml" => "xhtml",
        "application/x-mobipocket-ebook" => "mobi",
        "application/x-shockwave-flash" => "swf",
        "application/x-perl" => "pl",
        "application/x-tcl" => "tcl",
        "application/x-texinfo" => "texi",
        "application/font-sfnt" => "ttf",
        // documents
        "application/rtf" => "rtf",
        "application/epub+zip" => "epub",
        "application/msword" => "doc",
        "application/vnd.ms-excel" => "xls",
        "application/vnd.ms-powerpoint" => "ppt",
        "application/vnd.ms-project" => "mpp",
        "application/vnd.ms-outlook" => "msg",
        "application/vnd.ms-works" => "wps",
        "application/vnd.visio" => "vsd",
        "application/msaccess" => "accdb",
        "application/onenote" => "one",
        "application/mathematica" => "nb",
        "application/vnd.oasis.opendocument.text" => "odt",
        "application/vnd.oasis.opendocument.spreadsheet" => "ods",
        "application/vnd.oasis.opendocument.presentation" => "odp",
        "application/vnd.google-apps.script+json" => "json",
        PDF => "pdf",
        DOCX => "docx",
        XLSX => "xlsx",
        PPTX => "pptx",
        _ => return None,
    };
    Some(ext)
}

/// All extensions conventionally used for a MIME type, primary first.
pub fn extensions_for(mime: &str) -> Vec<&'static str> {
    let essence = mime
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let mut extensions: Vec<&'static str> = preferred_extension(&essence).into_iter().collect();

    if let Some(known) = mime_guess::get_mime_extensions_str(&essence) {
        for ext in known {
            if !extensions.contains(ext) {
                extensions.push(*ext);
            }
        }
    }

    extensions
}

/// Append the primary extension for `mime` unless the name already ends
/// with one of its known extensions (case-insensitive).
pub fn add_extension(filename: &str, mime: &str) -> String {
    let extensions = extensions_for(mime);
    let Some(primary) = extensions.first() else {
        return filename.to_string();
    };

    let lower = filename.to_lowercase();
    let has_known_suffix = extensions
        .iter()
        .any(|ext| lower.ends_with(&format!(".{}", ext.to_lowercase())));

    if has_known_suffix {
        filename.to_string()
    } else {
        format!("{}.{}", filename, primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_mime_type_priority() {
        assert_eq!(choose_mime_type(&["application/pdf", "image/png"], "x"), PDF);
        assert_eq!(
            choose_mime_type(
                &[
                    "text/plain",
                    "application/vnd.oasis.opendocument.text",
                    DOCX,
                    PDF
                ],
                GOOGLE_DOCUMENT
            ),
            DOCX
        );
        assert_eq!(
            choose_mime_type(
                &["text/plain", "application/vnd.oasis.opendocument.text", PDF],
                GOOGLE_DOCUMENT
            ),
            "application/vnd.oasis.opendocument.text"
        );
        assert_eq!(
            choose_mime_type(&["image/svg+xml", "text/plain"], GOOGLE_DRAWING),
            "image/svg+xml"
        );
        assert_eq!(
            choose_mime_type(&["text/plain", "text/html"], GOOGLE_DOCUMENT),
            "text/plain"
        );
    }

    #[test]
    fn test_choose_mime_type_without_choices() {
        let none: [&str; 0] = [];
        assert_eq!(choose_mime_type(&none, GOOGLE_DOCUMENT), DOCX);
        assert_eq!(choose_mime_type(&none, GOOGLE_SPREADSHEET), XLSX);
        assert_eq!(choose_mime_type(&none, GOOGLE_PRESENTATION), PPTX);
        assert_eq!(choose_mime_type(&none, GOOGLE_DRAWING), PDF);
        assert_eq!(choose_mime_type(&none, FOLDER_MIME), FOLDER_MIME);
    }

    #[test]
    fn test_add_extension() {
        assert_eq!(add_extension("report", PDF), "report.pdf");
        assert_eq!(add_extension("report.pdf", PDF), "report.pdf");
        assert_eq!(add_extension("REPORT.PDF", PDF), "REPORT.PDF");
        assert_eq!(add_extension("essay", DOCX), "essay.docx");
        assert_eq!(add_extension("photo", "image/jpeg"), "photo.jpg");
    }

    #[test]
    fn test_add_extension_uses_canonical_extension() {
        assert_eq!(
            add_extension("model.dwg", "application/octet-stream"),
            "model.dwg.bin"
        );
        assert_eq!(
            add_extension("installer.exe", "application/octet-stream"),
            "installer.exe"
        );
        assert_eq!(add_extension("lecture", "video/x-matroska"), "lecture.mkv");
        assert_eq!(add_extension("README", "text/markdown"), "README.md");
        assert_eq!(add_extension("README.markdown", "text/markdown"), "README.markdown");
        assert_eq!(add_extension("podcast", "audio/mp4"), "podcast.m4a");
        assert_eq!(add_extension("scan", "image/tiff"), "scan.tiff");
    }

    #[test]
    fn test_extensions_for_puts_canonical_first() {
        assert_eq!(extensions_for("video/x-matroska").first(), Some(&"mkv"));
        assert_eq!(extensions_for("text/markdown").first(), Some(&"md"));
        assert_eq!(extensions_for("application/octet-stream").first(), Some(&"bin"));
        assert!(extensions_for("application/octet-stream").contains(&"exe"));
    }

    #[test]
    fn test_add_extension_accepts_alternate_suffix() {
        assert_eq!(add_extension("photo.jpeg", "image/jpeg"), "photo.jpeg");
    }

    #[test]
    fn test_add_extension_unknown_mime() {
        assert_eq!(add_extension("folder", FOLDER_MIME), "folder");
        assert_eq!(add_extension("blob", "application/x-unknown-thing"), "blob");
        assert_eq!(add_extension("blob", ""), "blob");
    }

    #[test]
    fn test_extensions_for_ignores_parameters() {
        assert_eq!(extensions_for("text/plain; charset=utf-8").first(), Some(&"txt"));
    }
}
