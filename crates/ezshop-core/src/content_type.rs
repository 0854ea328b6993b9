// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image type detection from magic bytes.

/// A sniffed upload type: MIME type plus file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageKind {
    pub mime: &'static str,
    pub extension: &'static str,
}

pub const PNG: ImageKind = ImageKind {
    mime: "image/png",
    extension: "png",
};
pub const JPEG: ImageKind = ImageKind {
    mime: "image/jpeg",
    extension: "jpg",
};
pub const GIF: ImageKind = ImageKind {
    mime: "image/gif",
    extension: "gif",
};
pub const OPAQUE: ImageKind = ImageKind {
    mime: "application/octet-stream",
    extension: "bin",
};

/// Detects PNG, JPEG and GIF from the leading bytes; anything else is opaque binary.
pub fn sniff(bytes: &[u8]) -> ImageKind {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        PNG
    } else if bytes.starts_with(&[0xFF, 0xD8]) {
        JPEG
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        GIF
    } else {
        OPAQUE
    }
}

/// Reverse lookup used when only the MIME type is known.
pub fn from_mime(mime: &str) -> ImageKind {
    [PNG, JPEG, GIF]
        .into_iter()
        .find(|k| k.mime == mime)
        .unwrap_or(OPAQUE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_bytes() {
        assert_eq!(sniff(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]), PNG);
        assert_eq!(sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), JPEG);
        assert_eq!(sniff(b"GIF89a...."), GIF);
        assert_eq!(sniff(b"GIF87a"), GIF);
        assert_eq!(sniff(b"GIF8"), OPAQUE);
        assert_eq!(sniff(b""), OPAQUE);
        assert_eq!(sniff(b"RIFF....WEBP"), OPAQUE);
    }

    #[test]
    fn mime_lookup() {
        assert_eq!(from_mime("image/png").extension, "png");
        assert_eq!(from_mime("text/plain"), OPAQUE);
    }
}
