use std::fs;
use std::path::Path;

use anyhow::Result;
use image::{ColorType, ImageFormat, Rgba, RgbaImage};
use imagevert::out::Out;
use imagevert::{ColorPolicy, FailureKind, Job, MissingInputDirectory, Report, Status};
use tempfile::TempDir;
use termcolor::Buffer;

/// Write a small semi-transparent image to `root/relative`.
fn write_image(root: &Path, relative: &str, format: ImageFormat) {
    let path = root.join(relative);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }

    RgbaImage::from_pixel(4, 3, Rgba([200, 100, 50, 128]))
        .save_with_format(&path, format)
        .unwrap();
}

fn tif(root: &Path, relative: &str) {
    write_image(root, relative, ImageFormat::Tiff);
}

/// Input directory with `a.tif`, `b.tif` and `sub/c.tif`.
fn fixture() -> (TempDir, TempDir) {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    tif(input.path(), "a.tif");
    tif(input.path(), "b.tif");
    tif(input.path(), "sub/c.tif");
    (input, output)
}

fn run(job: &Job) -> Result<(Report, String)> {
    let mut buf = Buffer::no_color();
    let report = imagevert::convert::run(job, &mut Out::new(&mut buf))?;
    Ok((report, String::from_utf8(buf.into_inner())?))
}

#[test]
fn recursive() -> Result<()> {
    let (input, output) = fixture();
    let job = Job::new(input.path(), output.path(), "tif", "jpeg")?.recursive(true);

    let (report, text) = run(&job)?;

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.converted(), 3);
    assert_eq!(report.failed(), 0);

    for name in ["a.jpeg", "b.jpeg", "sub/c.jpeg"] {
        let converted = image::open(output.path().join(name))?;
        assert_eq!(converted.color(), ColorType::Rgb8);
        assert_eq!((converted.width(), converted.height()), (4, 3));
    }

    for name in ["a.tif", "b.tif", "sub/c.tif"] {
        assert!(input.path().join(name).is_file());
    }

    assert!(text.contains("converting: "));
    assert!(!text.contains("deleted: "));
    Ok(())
}

#[test]
fn not_recursive() -> Result<()> {
    let (input, output) = fixture();
    let job = Job::new(input.path(), output.path(), "tif", "jpeg")?;

    let (report, _) = run(&job)?;

    assert_eq!(report.converted(), 2);
    assert!(output.path().join("a.jpeg").is_file());
    assert!(output.path().join("b.jpeg").is_file());
    assert!(!output.path().join("sub").exists());
    assert!(input.path().join("sub/c.tif").is_file());
    assert!(report.get(&input.path().join("sub/c.tif")).is_none());
    Ok(())
}

#[test]
fn corrupt_file_does_not_abort() -> Result<()> {
    let (input, output) = fixture();
    fs::write(input.path().join("a.tif"), b"definitely not a tiff")?;

    let job = Job::new(input.path(), output.path(), "tif", "jpeg")?.recursive(true);
    let (report, text) = run(&job)?;

    let a = report.get(&input.path().join("a.tif")).unwrap();
    let Status::Failed(failure) = &a.status else {
        panic!("expected a.tif to fail: {:?}", a.status);
    };
    assert_eq!(failure.kind, FailureKind::Decode);

    assert_eq!(report.converted(), 2);
    assert_eq!(report.failed(), 1);
    assert!(!output.path().join("a.jpeg").exists());
    assert!(output.path().join("b.jpeg").is_file());
    assert!(output.path().join("sub/c.jpeg").is_file());
    assert!(text.contains("error: "));
    Ok(())
}

#[test]
fn case_insensitive_matching() -> Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;

    tif(input.path(), "ONE.TIF");
    tif(input.path(), "two.tif");
    tif(input.path(), "three.Tif");
    tif(input.path(), "notatif.tif");
    tif(input.path(), "archive.tif.bak");
    tif(input.path(), "four.tiff");

    let job = Job::new(input.path(), output.path(), "TIF", "PNG")?;
    let (report, _) = run(&job)?;

    assert_eq!(report.converted(), 4);

    for name in ["ONE.png", "two.png", "three.png", "notatif.png"] {
        assert!(output.path().join(name).is_file(), "missing {name}");
    }

    assert!(!output.path().join("archive.tif.png").exists());
    assert!(!output.path().join("four.png").exists());
    Ok(())
}

#[test]
fn delete_original() -> Result<()> {
    let (input, output) = fixture();
    fs::write(input.path().join("b.tif"), b"garbage")?;

    let job = Job::new(input.path(), output.path(), "tif", "jpeg")?
        .recursive(true)
        .delete_original(true);

    let (report, text) = run(&job)?;

    assert_eq!(report.deleted(), 2);
    assert!(!input.path().join("a.tif").exists());
    assert!(!input.path().join("sub/c.tif").exists());
    assert!(output.path().join("a.jpeg").is_file());
    assert!(output.path().join("sub/c.jpeg").is_file());

    // Sources which failed to convert are kept.
    assert!(input.path().join("b.tif").is_file());
    assert!(text.contains("deleted: "));
    Ok(())
}

#[test]
fn failed_write_keeps_source() -> Result<()> {
    let (input, output) = fixture();
    fs::create_dir_all(output.path().join("a.jpeg"))?;

    let job = Job::new(input.path(), output.path(), "tif", "jpeg")?.delete_original(true);
    let (report, _) = run(&job)?;

    let a = report.get(&input.path().join("a.tif")).unwrap();
    assert_eq!(a.failure().map(|f| f.kind), Some(FailureKind::Write));
    assert!(input.path().join("a.tif").is_file());

    assert!(!input.path().join("b.tif").exists());
    assert!(output.path().join("b.jpeg").is_file());
    Ok(())
}

#[test]
fn collision() -> Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;

    tif(input.path(), "a.tif");
    tif(input.path(), "a.TIF");

    let job = Job::new(input.path(), output.path(), "tif", "jpeg")?.delete_original(true);
    let (report, _) = run(&job)?;

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.converted(), 1);
    assert_eq!(report.deleted(), 1);

    let failed = report
        .outcomes
        .iter()
        .find_map(|o| o.failure())
        .unwrap();

    assert_eq!(failed.kind, FailureKind::Collision);
    assert!(output.path().join("a.jpeg").is_file());
    Ok(())
}

#[test]
fn missing_input_directory() -> Result<()> {
    let root = tempfile::tempdir()?;
    let output = root.path().join("output");

    let job = Job::new(root.path().join("missing"), &output, "tif", "jpeg")?;
    let error = run(&job).unwrap_err();

    assert!(error.downcast_ref::<MissingInputDirectory>().is_some());
    assert!(!output.exists());
    Ok(())
}

#[test]
fn keep_alpha() -> Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;
    write_image(input.path(), "logo.png", ImageFormat::Png);

    let job = Job::new(input.path(), output.path().join("rgb"), "png", "png")?;
    run(&job)?;
    assert_eq!(
        image::open(output.path().join("rgb/logo.png"))?.color(),
        ColorType::Rgb8
    );

    let job = Job::new(input.path(), output.path().join("rgba"), "png", "png")?
        .color(ColorPolicy::Preserve);
    run(&job)?;
    assert_eq!(
        image::open(output.path().join("rgba/logo.png"))?.color(),
        ColorType::Rgba8
    );
    Ok(())
}

#[test]
fn nested_output_is_not_an_input() -> Result<()> {
    let input = tempfile::tempdir()?;
    write_image(input.path(), "a.png", ImageFormat::Png);
    let output = input.path().join("converted");

    let job = Job::new(input.path(), &output, "png", "png")?.recursive(true);

    let (report, _) = run(&job)?;
    assert_eq!(report.outcomes.len(), 1);
    assert!(output.join("a.png").is_file());

    let (report, _) = run(&job)?;
    assert_eq!(report.outcomes.len(), 1);
    assert!(!output.join("converted").exists());
    Ok(())
}

#[test]
fn jpeg_quality() -> Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;

    let mut noisy = RgbaImage::new(64, 64);
    for (x, y, pixel) in noisy.enumerate_pixels_mut() {
        let v = ((x * 31 + y * 17) % 256) as u8;
        *pixel = Rgba([v, v.wrapping_mul(3), v.wrapping_mul(7), 255]);
    }
    noisy.save_with_format(input.path().join("noise.bmp"), ImageFormat::Bmp)?;

    let low = Job::new(input.path(), output.path().join("low"), "bmp", "jpg")?.quality(10);
    let high = Job::new(input.path(), output.path().join("high"), "bmp", "jpg")?.quality(100);
    run(&low)?;
    run(&high)?;

    let low = fs::metadata(output.path().join("low/noise.jpg"))?.len();
    let high = fs::metadata(output.path().join("high/noise.jpg"))?.len();
    assert!(low < high, "{low} >= {high}");
    Ok(())
}

#[test]
fn in_place_conversion_keeps_output() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_image(dir.path(), "a.png", ImageFormat::Png);

    let job = Job::new(dir.path(), dir.path(), "png", "png")?.delete_original(true);
    let (report, _) = run(&job)?;

    assert_eq!(report.converted(), 1);
    assert_eq!(report.deleted(), 0);
    assert_eq!(image::open(dir.path().join("a.png"))?.color(), ColorType::Rgb8);
    Ok(())
}

#[test]
fn failed_in_place_encode_keeps_source() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("a.ico");

    // Decodes fine, but is too large to be encoded as an icon.
    RgbaImage::new(300, 300).save_with_format(&source, ImageFormat::Png)?;
    let before = fs::read(&source)?;

    let job = Job::new(dir.path(), dir.path(), "ico", "ico")?.delete_original(true);
    let (report, _) = run(&job)?;

    let a = report.get(&source).unwrap();
    assert_eq!(a.failure().map(|f| f.kind), Some(FailureKind::Encode));
    assert_eq!(fs::read(&source)?, before);

    let names = fs::read_dir(dir.path())?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<Vec<_>>>()?;
    assert_eq!(names, ["a.ico"]);
    Ok(())
}

#[test]
fn failed_encode_keeps_previous_output() -> Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;

    RgbaImage::new(300, 300).save_with_format(input.path().join("a.png"), ImageFormat::Png)?;
    fs::write(output.path().join("a.ico"), b"previous")?;

    let job = Job::new(input.path(), output.path(), "png", "ico")?;
    let (report, _) = run(&job)?;

    assert_eq!(report.failed(), 1);
    assert_eq!(fs::read(output.path().join("a.ico"))?, b"previous");
    Ok(())
}

/// Restores permissions of a directory when dropped.
#[cfg(unix)]
struct Restricted<'a> {
    dir: &'a Path,
}

#[cfg(unix)]
impl<'a> Restricted<'a> {
    /// Restrict permissions of `dir` to `mode`.
    ///
    /// Returns `None` if permissions are not enforced, like when running as
    /// root.
    fn new(dir: &'a Path, mode: u32) -> Result<Option<Self>> {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(dir, fs::Permissions::from_mode(mode))?;
        let this = Self { dir };

        if fs::File::create(dir.join("writable")).is_ok() {
            return Ok(None);
        }

        Ok(Some(this))
    }
}

#[cfg(unix)]
impl Drop for Restricted<'_> {
    fn drop(&mut self) {
        use std::os::unix::fs::PermissionsExt;
        _ = fs::set_permissions(self.dir, fs::Permissions::from_mode(0o755));
    }
}

#[cfg(unix)]
#[test]
fn failed_delete_does_not_abort() -> Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;

    tif(input.path(), "a_locked/x.tif");
    tif(input.path(), "b.tif");

    let locked = input.path().join("a_locked");

    let Some(_restricted) = Restricted::new(&locked, 0o555)? else {
        return Ok(());
    };

    let job = Job::new(input.path(), output.path(), "tif", "jpeg")?
        .recursive(true)
        .delete_original(true);

    let (report, text) = run(&job)?;

    let x = report.get(&locked.join("x.tif")).unwrap();
    let Status::DeleteFailed(failure) = &x.status else {
        panic!("expected deletion of x.tif to fail: {:?}", x.status);
    };
    assert_eq!(failure.kind, FailureKind::Delete);
    assert!(locked.join("x.tif").is_file());
    assert!(output.path().join("a_locked/x.jpeg").is_file());

    let b = report.get(&input.path().join("b.tif")).unwrap();
    assert!(matches!(b.status, Status::Converted { deleted: true }));
    assert!(output.path().join("b.jpeg").is_file());

    assert_eq!(report.converted(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.deleted(), 1);
    assert!(text.contains("error: "));
    Ok(())
}

#[cfg(unix)]
#[test]
fn unreadable_directory_is_skipped() -> Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;

    tif(input.path(), "a_secret/c.tif");
    tif(input.path(), "b.tif");
    tif(input.path(), "sub/d.tif");

    let secret = input.path().join("a_secret");

    let Some(_restricted) = Restricted::new(&secret, 0o000)? else {
        return Ok(());
    };

    let job = Job::new(input.path(), output.path(), "tif", "jpeg")?.recursive(true);
    let (report, text) = run(&job)?;

    assert!(text.contains("warning: "), "{text}");
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.converted(), 2);
    assert!(output.path().join("b.jpeg").is_file());
    assert!(output.path().join("sub/d.jpeg").is_file());
    assert!(!output.path().join("a_secret").exists());
    Ok(())
}
