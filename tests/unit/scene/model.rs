use super::*;

#[test]
fn unknown_enum_values_fall_back_to_documented_defaults() {
    assert_eq!(DialogueType::parse_lossy("cutscene"), DialogueType::Dialogue);
    assert_eq!(Lang::parse_lossy("fr"), Lang::En);
    assert_eq!(Emotion::parse_lossy("joy"), Emotion::None);
    assert_eq!(EmotionSide::parse_lossy("middle"), EmotionSide::Left);
}

#[test]
fn side_accepts_short_and_long_spellings() {
    assert_eq!(EmotionSide::parse("r"), Some(EmotionSide::Right));
    assert_eq!(EmotionSide::parse("right"), Some(EmotionSide::Right));
    assert_eq!(EmotionSide::parse("l"), Some(EmotionSide::Left));
    assert_eq!(EmotionSide::Right.as_str(), "r");
}

#[test]
fn canonical_spellings_parse_back() {
    for t in DialogueType::ALL {
        assert_eq!(DialogueType::parse(t.as_str()), Some(*t));
    }
    for l in Lang::ALL {
        assert_eq!(Lang::parse(l.as_str()), Some(*l));
    }
    assert_eq!(Emotion::ALL.len(), 11);
}

#[test]
fn emotion_none_has_no_texture() {
    assert_eq!(Emotion::None.texture_key(EmotionSide::Left), None);
    assert_eq!(
        Emotion::Sweat.texture_key(EmotionSide::Right).as_deref(),
        Some("sweat_r")
    );
    assert_eq!(Lang::ZhCn.skip_texture_key(), "skip_zh_cn");
}

#[test]
fn scene_json_uses_camel_case_and_defaults() {
    let scene = Scene::from_json_str(
        r#"{
            "layers": [
                { "image": "bg.png", "offsetY": 155, "kind": "background" },
                { "image": "p.png", "flipX": true, "scale": 0.5 }
            ],
            "settings": {
                "speaker": "Euden",
                "dialogueText": "Hi",
                "dialogueType": "bogus",
                "font": "ja",
                "emotion": "heart",
                "emotionSide": "r"
            }
        }"#,
    )
    .unwrap();

    assert_eq!(scene.layers.len(), 2);
    assert_eq!(scene.layers[0].kind, LayerKind::Background);
    assert_eq!(scene.layers[0].offset_y, 155.0);
    assert_eq!(scene.layers[0].opacity, 1.0);
    assert_eq!(scene.layers[1].kind, LayerKind::Portrait);
    assert!(scene.layers[1].flip_x);
    assert_eq!(scene.settings.dialogue_type, DialogueType::Dialogue);
    assert_eq!(scene.settings.font, Lang::Ja);
    assert_eq!(scene.settings.emotion, Emotion::Heart);
    assert_eq!(scene.settings.emotion_side, EmotionSide::Right);
    scene.validate().unwrap();
}

#[test]
fn non_positive_scale_is_rejected() {
    let mut layer = Layer::new("p.png");
    layer.scale = 0.0;
    assert!(layer.validate().is_err());
    layer.scale = f64::NAN;
    assert!(layer.validate().is_err());
    layer.scale = 2.0;
    layer.validate().unwrap();
}

#[test]
fn alpha_is_clamped() {
    let mut layer = Layer::new("p.png");
    layer.opacity = 3.0;
    assert_eq!(layer.alpha(), 1.0);
    layer.opacity = -1.0;
    assert_eq!(layer.alpha(), 0.0);
}
