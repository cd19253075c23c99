//! Shell stand-in for ffmpeg, so encode and mux paths run without the real binary.
//!
//! The encode call is recognised by its `pipe:0` input; anything else is a mux call.
//! `$last` is the output path, `$5` the first `-i` input of a mux call.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Drain stdin into the output file.
pub const ENCODE_OK: &str = r#"cat > "$last""#;
/// Fail before reading any frames.
pub const ENCODE_REJECT: &str = r#"echo "Unknown encoder 'mpeg4'" >&2; exit 1"#;
/// Copy the silent video through as the final output.
pub const MUX_COPY: &str = r#"cp "$5" "$last""#;
/// Leave a partial output behind, then fail.
pub const MUX_FAIL: &str = r#"echo partial > "$last"; echo "mux boom" >&2; exit 1"#;

pub fn fake_ffmpeg(dir: &Path, encode: &str, mux: &str) -> PathBuf {
    let path = dir.join("fake-ffmpeg");
    let script = format!(
        "#!/bin/sh\nfor last; do :; done\ncase \" $* \" in\n*\" pipe:0 \"*)\n{}\n;;\n*)\n{}\n;;\nesac\n",
        encode, mux
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
