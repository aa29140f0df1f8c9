//! MIME type detection for cacheable static assets.
//!
//! Only formats that are safe to mirror verbatim into the public cache are
//! known here. Anything else maps to `OCTET_STREAM` and is never cached.

/// Common MIME type constants.
pub mod types {
    // Text
    pub const CSS: &str = "text/css";
    pub const JAVASCRIPT: &str = "text/javascript";
    pub const JSON: &str = "application/json";

    // Binary
    pub const OCTET_STREAM: &str = "application/octet-stream";
    pub const WASM: &str = "application/wasm";
    pub const PDF: &str = "application/pdf";

    // Images
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const WEBP: &str = "image/webp";
    pub const AVIF: &str = "image/avif";
    pub const SVG: &str = "image/svg+xml";
    pub const ICO: &str = "image/x-icon";
    pub const BMP: &str = "image/bmp";
    pub const TIFF: &str = "image/tiff";

    // Audio
    pub const MP3: &str = "audio/mpeg";
    pub const WAV: &str = "audio/wav";
    pub const OGG_AUDIO: &str = "audio/ogg";
    pub const FLAC: &str = "audio/flac";
    pub const AAC: &str = "audio/aac";

    // Video
    pub const MP4: &str = "video/mp4";
    pub const WEBM: &str = "video/webm";
    pub const OGG_VIDEO: &str = "video/ogg";
    pub const MOV: &str = "video/quicktime";

    // Fonts
    pub const WOFF: &str = "font/woff";
    pub const WOFF2: &str = "font/woff2";
    pub const TTF: &str = "font/ttf";
    pub const OTF: &str = "font/otf";
    pub const EOT: &str = "application/vnd.ms-fontobject";
}

/// Guess MIME type from a lowercase file extension.
pub fn from_extension(ext: &str) -> &'static str {
    match ext {
        "css" => types::CSS,
        "js" | "mjs" | "cjs" => types::JAVASCRIPT,
        "json" | "map" => types::JSON,

        // Images
        "svg" => types::SVG,
        "png" => types::PNG,
        "jpg" | "jpeg" => types::JPEG,
        "gif" => types::GIF,
        "webp" => types::WEBP,
        "avif" => types::AVIF,
        "ico" => types::ICO,
        "bmp" => types::BMP,
        "tif" | "tiff" => types::TIFF,

        // Audio
        "mp3" => types::MP3,
        "wav" => types::WAV,
        "ogg" | "oga" => types::OGG_AUDIO,
        "flac" => types::FLAC,
        "aac" | "m4a" => types::AAC,

        // Video
        "mp4" | "m4v" => types::MP4,
        "webm" => types::WEBM,
        "ogv" => types::OGG_VIDEO,
        "mov" => types::MOV,

        // Fonts
        "woff" => types::WOFF,
        "woff2" => types::WOFF2,
        "ttf" => types::TTF,
        "otf" => types::OTF,
        "eot" => types::EOT,

        "pdf" => types::PDF,
        "wasm" => types::WASM,

        _ => types::OCTET_STREAM,
    }
}

/// Check if the extension names a static format that may be cached.
pub fn is_static_extension(ext: &str) -> bool {
    from_extension(ext) != types::OCTET_STREAM
}

/// Check if the MIME type represents an image.
pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}

/// Check if the MIME type represents a script.
pub fn is_script(mime: &str) -> bool {
    let essence = essence(mime);
    matches!(
        essence,
        "text/javascript" | "application/javascript" | "application/x-javascript"
    )
}

/// Check if the MIME type represents a stylesheet.
pub fn is_stylesheet(mime: &str) -> bool {
    essence(mime) == types::CSS
}

/// Strip parameters (`; charset=utf-8`) and surrounding whitespace.
fn essence(mime: &str) -> &str {
    mime.split(';').next().unwrap_or(mime).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(from_extension("css"), types::CSS);
        assert_eq!(from_extension("js"), types::JAVASCRIPT);
        assert_eq!(from_extension("png"), types::PNG);
        assert_eq!(from_extension("jpeg"), types::JPEG);
        assert_eq!(from_extension("woff2"), types::WOFF2);
        assert_eq!(from_extension("php"), types::OCTET_STREAM);
        assert_eq!(from_extension("html"), types::OCTET_STREAM);
    }

    #[test]
    fn test_is_static_extension() {
        assert!(is_static_extension("svg"));
        assert!(is_static_extension("mp4"));
        assert!(!is_static_extension("php"));
        assert!(!is_static_extension(""));
    }

    #[test]
    fn test_mime_predicates() {
        assert!(is_image(types::PNG));
        assert!(is_image(types::SVG));
        assert!(!is_image(types::CSS));
        assert!(is_script("application/javascript"));
        assert!(is_script("text/javascript; charset=utf-8"));
        assert!(is_stylesheet("text/css; charset=utf-8"));
        assert!(!is_stylesheet(types::JAVASCRIPT));
    }
}
