use super::*;

fn args(cmd: &Command) -> Vec<String> {
    cmd.get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

fn params(video_codec: &str) -> ClipParams {
    ClipParams {
        fps: 24,
        video_codec: video_codec.to_string(),
        audio_codec: "aac".to_string(),
    }
}

#[test]
fn clip_command_holds_image_for_duration() {
    let enc = FfmpegEncoder::default();
    let cmd = enc.clip_command(
        Path::new("page.png"),
        Path::new("narration.wav"),
        3.5,
        &params("libx264"),
        Path::new("clip.mp4.part"),
    );
    let a = args(&cmd);
    let pos = |s: &str| a.iter().position(|x| x == s).unwrap();

    assert_eq!(a[pos("-loop") + 1], "1");
    assert_eq!(a[pos("-framerate") + 1], "24");
    assert_eq!(a[pos("-t") + 1], "3.500000");
    assert_eq!(a[pos("-c:v") + 1], "libx264");
    assert_eq!(a[pos("-tune") + 1], "stillimage");
    assert_eq!(a[pos("-c:a") + 1], "aac");
    assert_eq!(a[pos("-f") + 1], "mp4");
    assert_eq!(a.last().unwrap(), "clip.mp4.part");
}

#[test]
fn still_image_tune_only_for_x264() {
    let enc = FfmpegEncoder::default();
    let cmd = enc.clip_command(
        Path::new("p.png"),
        Path::new("a.wav"),
        1.0,
        &params("libvpx-vp9"),
        Path::new("o.mp4"),
    );
    assert!(!args(&cmd).iter().any(|a| a == "-tune"));
}

#[test]
fn concat_command_stream_copies() {
    let enc = FfmpegEncoder::default();
    let a = args(&enc.concat_command(Path::new("list.txt"), Path::new("out.mp4")));
    let pos = |s: &str| a.iter().position(|x| x == s).unwrap();
    assert_eq!(a[pos("-f") + 1], "concat");
    assert_eq!(a[pos("-safe") + 1], "0");
    assert_eq!(a[pos("-c") + 1], "copy");
    assert_eq!(a.last().unwrap(), "out.mp4");
}

#[test]
fn concat_list_is_absolute_ordered_and_escaped() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("clip_a.mp4");
    let b = dir.path().join("it's.mp4");
    let list = concat_list(&[b.clone(), a.clone()]).unwrap();
    let lines: Vec<&str> = list.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("it'\\''s.mp4'"));
    assert!(lines[1].ends_with("clip_a.mp4'"));
    for line in lines {
        assert!(line.starts_with("file '"));
    }

    let rel = concat_list(&[PathBuf::from("rel.mp4")]).unwrap();
    let inner = rel.trim_end().trim_start_matches("file '");
    assert!(Path::new(inner.trim_end_matches('\'')).is_absolute());
}

#[test]
fn encode_rejects_zero_duration() {
    let err = FfmpegEncoder::default()
        .encode(
            Path::new("p.png"),
            Path::new("a.wav"),
            0.0,
            &params("libx264"),
            Path::new("o.mp4"),
        )
        .unwrap_err();
    assert_eq!(err.failed_stage(), Some(Stage::Encode));
}

#[test]
fn concat_rejects_empty_list() {
    let err = FfmpegEncoder::default()
        .concat(&[], Path::new("out.mp4"))
        .unwrap_err();
    assert!(matches!(err, SlidereelError::Assembly(_)));
}

#[test]
fn ensure_parent_dir_creates_nested_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("a").join("b").join("out.mp4");
    ensure_parent_dir(&out).unwrap();
    assert!(out.parent().unwrap().is_dir());
    ensure_parent_dir(Path::new("bare.mp4")).unwrap();
}
