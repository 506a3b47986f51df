use super::*;

fn seg(secs: f64) -> AudioPcm {
    let mut p = AudioPcm::empty(MIX_SAMPLE_RATE, MIX_CHANNELS);
    let frames = (secs * f64::from(MIX_SAMPLE_RATE)) as usize;
    p.interleaved_f32 = vec![0.5; frames * usize::from(MIX_CHANNELS)];
    p
}

#[test]
fn split_drops_blank_segments() {
    assert_eq!(
        split_segments("Hello. [pause] World. [pause][pause]  [pause] Bye."),
        vec!["Hello.", "World.", "Bye."]
    );
    assert_eq!(split_segments("no markers"), vec!["no markers"]);
    assert!(split_segments("   ").is_empty());
    assert!(split_segments("[pause] [pause]").is_empty());
}

#[test]
fn pauses_between_segments_and_after_slide() {
    let out = assemble(&[seg(1.0), seg(0.5), seg(0.25)], 1.0, 0.5).unwrap();
    // 1.75 speech + 2 * 1.0 inline + 0.5 trailing
    assert!((out.duration_sec() - 4.25).abs() < 1e-6);

    let first_pause_start = MIX_SAMPLE_RATE as usize * usize::from(MIX_CHANNELS);
    assert_eq!(out.interleaved_f32[first_pause_start - 1], 0.5);
    assert_eq!(out.interleaved_f32[first_pause_start], 0.0);
    assert_eq!(*out.interleaved_f32.last().unwrap(), 0.0);
}

#[test]
fn single_segment_gets_no_inline_pause() {
    let out = assemble(&[seg(1.0)], 3.0, 0.0).unwrap();
    assert!((out.duration_sec() - 1.0).abs() < 1e-6);
}

#[test]
fn segments_in_other_formats_are_conformed() {
    let mono = AudioPcm {
        sample_rate: 24_000,
        channels: 1,
        interleaved_f32: vec![0.25; 24_000],
    };
    let out = assemble(&[mono], 0.0, 0.0).unwrap();
    assert_eq!(out.sample_rate, MIX_SAMPLE_RATE);
    assert_eq!(out.channels, MIX_CHANNELS);
    assert!((out.duration_sec() - 1.0).abs() < 1e-6);
}

#[test]
fn zero_segments_fail_in_mix_stage() {
    let err = assemble(&[], 1.0, 1.0).unwrap_err();
    assert_eq!(err.failed_stage(), Some(Stage::Mix));
}
