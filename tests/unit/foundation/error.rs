use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        SlidereelError::input("x")
            .to_string()
            .contains("input error:")
    );
    assert!(
        SlidereelError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        SlidereelError::assembly("x")
            .to_string()
            .contains("assembly error:")
    );
    assert!(
        SlidereelError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn stage_errors_name_their_stage() {
    let err = SlidereelError::stage(Stage::Rasterize, "page 9 out of range");
    assert_eq!(err.to_string(), "rasterize stage failed: page 9 out of range");
    assert_eq!(err.failed_stage(), Some(Stage::Rasterize));

    let err = SlidereelError::Timeout {
        stage: Stage::Synthesize,
        after: Duration::from_millis(250),
    };
    assert!(err.to_string().starts_with("synthesize stage timed out"));
    assert_eq!(err.failed_stage(), Some(Stage::Synthesize));

    assert_eq!(SlidereelError::input("x").failed_stage(), None);
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = SlidereelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
