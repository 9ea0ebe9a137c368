//! C++ source generation.
//!
//! The header declares the resource table; the source file holds one byte
//! array per resource plus the table itself. Array contents are written one
//! byte at a time straight from a session cursor, so a resource is never held
//! in memory as a whole.

use mkres_core::{ChunkProducer, Session, Transform};
use std::error::Error;
use std::io::{self, Write};

const BYTES_PER_LINE: u64 = 16;
const BANNER: &str = "// Generated by mkres. Do not edit.\n";

/// Write the header declaring `mkres::Resource` and `mkres::resources()`.
pub fn write_header<W: Write>(out: &mut W) -> io::Result<()> {
    out.write_all(BANNER.as_bytes())?;
    out.write_all(
        b"#pragma once

#include <cstddef>
#include <cstdint>
#include <span>
#include <string_view>

namespace mkres {

struct Resource {
    std::string_view name;
    std::span<const std::uint8_t> data;
    std::size_t size;
    bool compressed;
};

std::span<const Resource> resources();

} // namespace mkres
",
    )
}

/// One rendered resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Resource name.
    pub name: String,
    /// Source size.
    pub size: u64,
    /// Bytes written to the array.
    pub stored_size: u64,
    /// Transform applied.
    pub transform: Transform,
}

/// Writer for the `.cpp` half of the output.
pub struct SourceWriter<W: Write> {
    out: W,
    rendered: Vec<Rendered>,
}

impl<W: Write> SourceWriter<W> {
    /// Start a source file that includes `header_name`.
    pub fn new(mut out: W, header_name: &str) -> io::Result<Self> {
        out.write_all(BANNER.as_bytes())?;
        writeln!(out, "#include \"{}\"", escape(header_name))?;
        out.write_all(b"\nnamespace mkres {\n")?;
        Ok(Self {
            out,
            rendered: Vec::new(),
        })
    }

    /// Drain `session` into a new array named after the resource index.
    ///
    /// Every byte is also appended to `capture` when one is given.
    pub fn embed<P: ChunkProducer>(
        &mut self,
        name: &str,
        transform: Transform,
        session: &mut Session<P>,
        mut capture: Option<&mut Vec<u8>>,
    ) -> Result<&Rendered, Box<dyn Error>> {
        let index = self.rendered.len();
        writeln!(self.out, "\n// {}", comment_safe(name))?;
        writeln!(self.out, "static const std::uint8_t data_{}[] = {{", index)?;

        let mut cursor = session.cursor()?;
        let mut written = 0u64;
        while cursor.advance()? {
            let byte = cursor.current()?;
            let sep = if written % BYTES_PER_LINE == 0 { "    " } else { " " };
            write!(self.out, "{}0x{:02x},", sep, byte)?;
            written += 1;
            if written % BYTES_PER_LINE == 0 {
                self.out.write_all(b"\n")?;
            }
            if let Some(buf) = capture.as_deref_mut() {
                buf.push(byte);
            }
        }

        if written == 0 {
            // C++ has no zero-length arrays.
            self.out.write_all(b"    0x00\n")?;
        } else if written % BYTES_PER_LINE != 0 {
            self.out.write_all(b"\n")?;
        }
        self.out.write_all(b"};\n")?;

        let size = cursor.stats().map_or(0, |s| s.bytes_in);
        self.rendered.push(Rendered {
            name: name.to_string(),
            size,
            stored_size: written,
            transform,
        });
        Ok(&self.rendered[index])
    }

    /// Write the resource table and return the underlying writer.
    pub fn finish(mut self) -> io::Result<(W, Vec<Rendered>)> {
        if self.rendered.is_empty() {
            self.out
                .write_all(b"\nstd::span<const Resource> resources() {\n    return {};\n}\n")?;
        } else {
            self.out.write_all(b"\nstatic const Resource table[] = {\n")?;
            for (index, r) in self.rendered.iter().enumerate() {
                writeln!(
                    self.out,
                    "    {{\"{}\", {{data_{}, {}}}, {}, {}}},",
                    escape(&r.name),
                    index,
                    r.stored_size,
                    r.size,
                    r.transform == Transform::Gzip
                )?;
            }
            self.out.write_all(b"};\n")?;
            self.out
                .write_all(b"\nstd::span<const Resource> resources() {\n    return table;\n}\n")?;
        }
        self.out.write_all(b"\n} // namespace mkres\n")?;
        self.out.flush()?;
        Ok((self.out, self.rendered))
    }
}

/// Escape a string for a C++ string literal.
///
/// Non-printable bytes use three-digit octal escapes, which cannot run into
/// the following character the way `\x` escapes do.
fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        match b {
            b'\\' => escaped.push_str("\\\\"),
            b'"' => escaped.push_str("\\\""),
            b'?' => escaped.push_str("\\?"),
            0x20..=0x7E => escaped.push(b as char),
            _ => escaped.push_str(&format!("\\{:03o}", b)),
        }
    }
    escaped
}

/// Keep a name from closing or continuing a `//` comment.
fn comment_safe(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_control() || c == '\\' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mkres_core::{CompressionConfig, SliceSource};
    use mkres_deflate::{decompress_with_capacity, resource_session};

    fn render(resources: &[(&str, &[u8], Transform)]) -> (String, Vec<Rendered>) {
        let config = CompressionConfig::new().with_buffer_len(16);
        let mut writer = SourceWriter::new(Vec::new(), "out.h").unwrap();
        for (name, data, transform) in resources {
            let mut session =
                resource_session(SliceSource::new(data), *transform, &config).unwrap();
            writer.embed(name, *transform, &mut session, None).unwrap();
        }
        let (bytes, rendered) = writer.finish().unwrap();
        (String::from_utf8(bytes).unwrap(), rendered)
    }

    #[test]
    fn test_header() {
        let mut out = Vec::new();
        write_header(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(BANNER));
        assert!(text.contains("struct Resource {"));
        assert!(text.contains("std::span<const Resource> resources();"));
    }

    #[test]
    fn test_plain_resource() {
        let (text, rendered) = render(&[("hi.txt", b"teste", Transform::None)]);

        assert!(text.contains("#include \"out.h\""));
        assert!(text.contains(
            "// hi.txt\nstatic const std::uint8_t data_0[] = {\n    0x74, 0x65, 0x73, 0x74, 0x65,\n};\n"
        ));
        assert!(text.contains("    {\"hi.txt\", {data_0, 5}, 5, false},\n"));
        assert!(text.ends_with("} // namespace mkres\n"));
        assert_eq!(rendered[0].size, 5);
        assert_eq!(rendered[0].stored_size, 5);
    }

    #[test]
    fn test_line_wrapping() {
        let data: Vec<u8> = (0..32).collect();
        let (text, _) = render(&[("seq", &data, Transform::None)]);
        let body: Vec<&str> = text
            .lines()
            .skip_while(|l| !l.starts_with("static const std::uint8_t data_0"))
            .skip(1)
            .take_while(|l| *l != "};")
            .collect();
        assert_eq!(body.len(), 2);
        assert!(body[0].starts_with("    0x00, 0x01,"));
        assert!(body[1].ends_with("0x1f,"));
    }

    #[test]
    fn test_empty_resource() {
        let (text, rendered) = render(&[("empty", b"", Transform::None)]);
        assert!(text.contains("static const std::uint8_t data_0[] = {\n    0x00\n};\n"));
        assert!(text.contains("{\"empty\", {data_0, 0}, 0, false},"));
        assert_eq!(rendered[0].stored_size, 0);
    }

    #[test]
    fn test_gzip_resource_and_capture() {
        let data = b"abcabcabcabcabcabcabcabcabcabcabcabcabcabc".repeat(10);
        let config = CompressionConfig::new().with_buffer_len(8);
        let mut writer = SourceWriter::new(Vec::new(), "res.h").unwrap();
        let mut session =
            resource_session(SliceSource::new(&data), Transform::Gzip, &config).unwrap();
        let mut captured = Vec::new();

        let rendered = writer
            .embed("abc", Transform::Gzip, &mut session, Some(&mut captured))
            .unwrap()
            .clone();
        assert_eq!(rendered.size, data.len() as u64);
        assert_eq!(rendered.stored_size, captured.len() as u64);
        assert!(rendered.stored_size < rendered.size);
        assert_eq!(decompress_with_capacity(&captured, data.len()).unwrap(), data);

        let (bytes, _) = writer.finish().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("    0x1f, 0x8b, 0x08,"));
        let entry = format!(
            "{{\"abc\", {{data_0, {}}}, {}, true}},",
            captured.len(),
            data.len()
        );
        assert!(text.contains(&entry));
    }

    #[test]
    fn test_no_resources() {
        let (text, rendered) = render(&[]);
        assert!(rendered.is_empty());
        assert!(text.contains("return {};"));
        assert!(!text.contains("table"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a/b.png"), "a/b.png");
        assert_eq!(escape("q\"\\"), "q\\\"\\\\");
        assert_eq!(escape("??="), "\\?\\?=");
        assert_eq!(escape("\n1"), "\\0121");
        assert_eq!(escape("é"), "\\303\\251");
        assert_eq!(comment_safe("a\nb\\"), "a_b_");
    }
}
