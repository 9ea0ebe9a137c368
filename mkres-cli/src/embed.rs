//! The embed command.

use crate::manifest::{ManifestEntry, write_manifest};
use crate::render::{Rendered, SourceWriter, write_header};
use crate::scan::{ResourceFile, scan};
use glob::Pattern;
use mkres_core::{CompressionConfig, ReaderSource, Transform};
use mkres_deflate::{decompress_with_capacity, resource_session};
use std::error::Error;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Options for an embed run.
pub struct EmbedOptions<'a> {
    pub inputs: &'a [PathBuf],
    pub recurse: bool,
    pub filter: Option<&'a str>,
    pub destination: &'a Path,
    pub transform: Transform,
    pub config: CompressionConfig,
    pub manifest: Option<&'a Path>,
    pub verify: bool,
}

pub fn cmd_embed(options: &EmbedOptions) -> Result<(), Box<dyn Error>> {
    options.config.validate()?;
    let pattern = options.filter.map(Pattern::new).transpose()?;

    let resources = scan(options.inputs, options.recurse, pattern.as_ref())?;
    if resources.is_empty() {
        warn!("no input files to embed");
    }

    let header_path = with_suffix(options.destination, ".h");
    let source_path = with_suffix(options.destination, ".cpp");
    let header_name = header_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or("destination has no file name")?;

    let rendered = write_sources(&resources, &header_path, &source_path, &header_name, options)?;

    info!(
        header = %header_path.display(),
        source = %source_path.display(),
        resources = rendered.len(),
        "wrote resource sources"
    );

    if let Some(manifest_path) = options.manifest {
        let entries: Vec<ManifestEntry> = rendered
            .iter()
            .zip(&resources)
            .map(|(r, file)| ManifestEntry::new(r, &file.path))
            .collect();
        let mut out = BufWriter::new(File::create(manifest_path)?);
        write_manifest(&mut out, &entries)?;
        out.flush()?;
        info!(path = %manifest_path.display(), "wrote manifest");
    }

    Ok(())
}

/// Render `resources` to `header_path` and `source_path`.
///
/// Both files are written under a `.tmp` name and renamed once everything
/// rendered, so a failed run leaves any previous outputs in place.
fn write_sources(
    resources: &[ResourceFile],
    header_path: &Path,
    source_path: &Path,
    header_name: &str,
    options: &EmbedOptions,
) -> Result<Vec<Rendered>, Box<dyn Error>> {
    let header_tmp = with_suffix(header_path, ".tmp");
    let source_tmp = with_suffix(source_path, ".tmp");

    let written = (|| -> Result<Vec<Rendered>, Box<dyn Error>> {
        let mut header = BufWriter::new(File::create(&header_tmp)?);
        let mut source = BufWriter::new(File::create(&source_tmp)?);
        let rendered = embed_into(resources, &mut header, &mut source, header_name, options)?;
        header.flush()?;
        source.flush()?;
        Ok(rendered)
    })();

    let rendered = match written {
        Ok(rendered) => rendered,
        Err(e) => {
            for tmp in [&header_tmp, &source_tmp] {
                if let Err(rm) = fs::remove_file(tmp) {
                    debug!(path = %tmp.display(), error = %rm, "could not remove partial output");
                }
            }
            return Err(e);
        }
    };

    fs::rename(&header_tmp, header_path)?;
    fs::rename(&source_tmp, source_path)?;
    Ok(rendered)
}

/// Render `resources` into a header and a source writer.
pub fn embed_into<H: Write, C: Write>(
    resources: &[ResourceFile],
    header: &mut H,
    source: C,
    header_name: &str,
    options: &EmbedOptions,
) -> Result<Vec<Rendered>, Box<dyn Error>> {
    write_header(header)?;
    let mut writer = SourceWriter::new(source, header_name)?;
    let verify = options.verify && options.transform == Transform::Gzip;
    let mut captured = Vec::new();

    for file in resources {
        debug!(name = %file.name, path = %file.path.display(), "embedding");
        let input = File::open(&file.path)
            .map_err(|e| format!("{}: {}", file.path.display(), e))?;
        let mut session =
            resource_session(ReaderSource::new(input), options.transform, &options.config)?;

        captured.clear();
        let capture = if verify { Some(&mut captured) } else { None };
        let rendered = writer.embed(&file.name, options.transform, &mut session, capture)?;

        info!(
            name = %rendered.name,
            size = rendered.size,
            stored = rendered.stored_size,
            compression = %rendered.transform,
            "embedded"
        );

        if verify {
            verify_resource(&file.path, &captured, rendered.size)?;
            debug!(name = %file.name, "verified");
        }
    }

    let (_, rendered) = writer.finish()?;
    Ok(rendered)
}

/// Decompress `compressed` and compare it with the file at `path`.
fn verify_resource(path: &Path, compressed: &[u8], size: u64) -> Result<(), Box<dyn Error>> {
    let original = fs::read(path)?;
    let capacity = usize::try_from(size)?;
    let restored = decompress_with_capacity(compressed, capacity)
        .map_err(|e| format!("{}: verification failed: {}", path.display(), e))?;
    if restored != original {
        return Err(format!(
            "{}: verification failed: decompressed data differs from the file",
            path.display()
        )
        .into());
    }
    Ok(())
}

/// `dest` with `suffix` appended to its last component.
fn with_suffix(dest: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = dest.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scratch::ScratchDir;

    fn crate_file(name: &str) -> ResourceFile {
        ResourceFile {
            name: name.to_string(),
            path: Path::new(env!("CARGO_MANIFEST_DIR")).join(name),
        }
    }

    fn options(transform: Transform, verify: bool) -> EmbedOptions<'static> {
        EmbedOptions {
            inputs: &[],
            recurse: false,
            filter: None,
            destination: Path::new("out"),
            transform,
            config: CompressionConfig::new().with_buffer_len(64),
            manifest: None,
            verify,
        }
    }

    #[test]
    fn test_embed_plain() {
        let resources = [crate_file("Cargo.toml")];
        let size = fs::metadata(&resources[0].path).unwrap().len();

        let mut header = Vec::new();
        let mut source = Vec::new();
        let rendered = embed_into(
            &resources,
            &mut header,
            &mut source,
            "out.h",
            &options(Transform::None, false),
        )
        .unwrap();

        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].size, size);
        assert_eq!(rendered[0].stored_size, size);

        let text = String::from_utf8(source).unwrap();
        // "[package]" starts every Cargo.toml.
        assert!(text.contains("    0x5b, 0x70, 0x61, 0x63, 0x6b, 0x61, 0x67, 0x65, 0x5d,"));
        assert!(!header.is_empty());
    }

    #[test]
    fn test_embed_gzip_with_verify() {
        let resources = [crate_file("Cargo.toml"), crate_file("src/main.rs")];
        let mut header = Vec::new();
        let mut source = Vec::new();
        let rendered = embed_into(
            &resources,
            &mut header,
            &mut source,
            "out.h",
            &options(Transform::Gzip, true),
        )
        .unwrap();

        assert_eq!(rendered.len(), 2);
        for r in &rendered {
            assert_eq!(r.transform, Transform::Gzip);
            assert!(r.stored_size < r.size);
        }
        let text = String::from_utf8(source).unwrap();
        assert!(text.contains("data_1[]"));
        assert!(text.contains(", true},"));
    }

    #[test]
    fn test_verify_detects_mismatch() {
        let path = crate_file("Cargo.toml").path;
        let size = fs::metadata(&path).unwrap().len();
        let other = vec![b'x'; size as usize];
        let compressed =
            mkres_deflate::compress_to_vec(&other, &CompressionConfig::new()).unwrap();

        let err = verify_resource(&path, &compressed, size).unwrap_err();
        assert!(err.to_string().contains("differs"));
    }

    #[test]
    fn test_missing_file() {
        let resources = [crate_file("missing.bin")];
        let err = embed_into(
            &resources,
            &mut Vec::<u8>::new(),
            Vec::<u8>::new(),
            "out.h",
            &options(Transform::None, false),
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing.bin"));
    }

    #[test]
    fn test_failed_run_keeps_previous_outputs() {
        let scratch = ScratchDir::new("embed-partial");
        let header_path = scratch.path().join("res.h");
        let source_path = scratch.path().join("res.cpp");
        fs::write(&header_path, b"// previous header\n").unwrap();
        fs::write(&source_path, b"// previous source\n").unwrap();

        let resources = [crate_file("Cargo.toml"), crate_file("missing.bin")];
        let err = write_sources(
            &resources,
            &header_path,
            &source_path,
            "res.h",
            &options(Transform::Gzip, false),
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing.bin"));

        assert_eq!(fs::read(&header_path).unwrap(), b"// previous header\n");
        assert_eq!(fs::read(&source_path).unwrap(), b"// previous source\n");
        let mut left: Vec<_> = fs::read_dir(scratch.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        left.sort();
        assert_eq!(left, ["res.cpp", "res.h"]);
    }

    #[test]
    fn test_write_sources_replaces_outputs() {
        let scratch = ScratchDir::new("embed-replace");
        let header_path = scratch.path().join("res.h");
        let source_path = scratch.path().join("res.cpp");
        fs::write(&source_path, b"// stale\n").unwrap();

        let resources = [crate_file("Cargo.toml")];
        let rendered = write_sources(
            &resources,
            &header_path,
            &source_path,
            "res.h",
            &options(Transform::None, false),
        )
        .unwrap();
        assert_eq!(rendered.len(), 1);

        let source = fs::read_to_string(&source_path).unwrap();
        assert!(source.contains("#include \"res.h\""));
        assert!(!source.contains("stale"));
        assert!(!fs::read(&header_path).unwrap().is_empty());
        assert!(!with_suffix(&source_path, ".tmp").exists());
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(with_suffix(Path::new("out"), ".h"), PathBuf::from("out.h"));
        assert_eq!(
            with_suffix(Path::new("gen/res.v1"), ".cpp"),
            PathBuf::from("gen/res.v1.cpp")
        );
    }
}
