//! End-to-end replays against the recording collaborators.

use pretty_assertions::assert_eq;
use std::io::Write;

use miniapp_cli::{parse_transcript, read_transcript, replay, Effect, EffectLog, ReplayOptions};
use miniapp_host::{HostConfig, PlaceholderStyle, SessionPhase, TerminationReason};
use miniapp_protocol::{PeerId, QueryId};

const APP_URL: &str = "https://shop.example/app";

fn pre_issued(button_text: Option<&str>) -> ReplayOptions {
    ReplayOptions {
        url: Some(APP_URL.to_string()),
        query_id: Some(QueryId(7)),
        button_text: button_text.map(str::to_string),
        ..Default::default()
    }
}

fn count(effects: &[Effect], wanted: &Effect) -> usize {
    effects.iter().filter(|e| *e == wanted).count()
}

fn position(effects: &[Effect], wanted: &Effect) -> Option<usize> {
    effects.iter().position(|e| e == wanted)
}

#[tokio::test]
async fn test_initial_surface_state_and_pre_issued_load() {
    let log = EffectLog::buffered();
    let summary = replay(&[], pre_issued(None), HostConfig::default(), log.clone())
        .await
        .unwrap();

    assert_eq!(
        log.effects(),
        vec![
            Effect::Background {
                color: "#ffffff".to_string()
            },
            Effect::ContentVisible { visible: false },
            Effect::Placeholder {
                placeholder: Some(PlaceholderStyle::Icon)
            },
            Effect::NavigationAlpha { alpha: 0.0 },
            Effect::Load {
                url: APP_URL.to_string()
            },
        ]
    );
    assert_eq!(summary.phase, SessionPhase::Loaded);
    assert_eq!(summary.query_id, Some(7));
    assert_eq!(summary.termination, None);
}

#[tokio::test]
async fn test_main_button_then_data_send() {
    let steps = parse_transcript(
        r#"
        # setup before any interaction is ignored
        {"step":"bridge","message":{"eventName":"web_app_setup_main_button","eventData":"{\"is_visible\":true,\"text\":\"Early\"}"}}
        {"step":"interaction"}
        {"step":"bridge","message":{"eventName":"web_app_setup_main_button","eventData":"{\"is_visible\":true,\"text\":\"Pay\"}"}}
        {"step":"bridge","message":{"eventName":"web_app_data_send","eventData":"{\"data\":\"order-42\"}"}}
        {"step":"close"}
        "#,
    )
    .unwrap();

    let log = EffectLog::buffered();
    let summary = replay(&steps, pre_issued(Some("Buy")), HostConfig::default(), log.clone())
        .await
        .unwrap();

    assert_eq!(summary.termination, Some(TerminationReason::DataSubmitted));
    assert_eq!(summary.steps_applied, 4);
    assert_eq!(summary.steps_skipped, 1);

    let effects = log.effects();
    let buttons: Vec<_> = effects
        .iter()
        .filter_map(|e| match e {
            Effect::MainButton { state } => Some(state.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(buttons.len(), 1);
    assert_eq!(buttons[0].text.as_deref(), Some("Pay"));
    assert!(buttons[0].is_visible);

    let submit = Effect::SubmitData {
        bot: 2,
        button_text: "Buy".to_string(),
        data: "order-42".to_string(),
    };
    let dismiss = position(&effects, &Effect::Dismiss).unwrap();
    let submitted = position(&effects, &submit).unwrap();
    assert!(dismiss < submitted);
    assert_eq!(count(&effects, &Effect::Dismiss), 1);
    assert_eq!(count(&effects, &Effect::Completion), 0);
}

#[tokio::test]
async fn test_data_send_without_button_is_ignored() {
    let steps = parse_transcript(
        r#"{"step":"bridge","message":{"eventName":"web_app_data_send","eventData":"{\"data\":\"x\"}"}}"#,
    )
    .unwrap();

    let log = EffectLog::buffered();
    let summary = replay(&steps, pre_issued(None), HostConfig::default(), log.clone())
        .await
        .unwrap();

    assert_eq!(summary.termination, None);
    assert!(log
        .effects()
        .iter()
        .all(|e| !matches!(e, Effect::SubmitData { .. } | Effect::Dismiss)));
}

#[tokio::test]
async fn test_request_path_and_keep_alive_completion() {
    let steps = parse_transcript("{\"step\":\"keep_alive\"}\n{\"step\":\"keep_alive_end\"}\n").unwrap();
    let options = ReplayOptions {
        bot: PeerId(55),
        from_menu: true,
        issued_url: "https://issued.example/start".to_string(),
        issued_query_id: QueryId(99),
        ..Default::default()
    };

    let log = EffectLog::buffered();
    let summary = replay(&steps, options, HostConfig::default(), log.clone())
        .await
        .unwrap();

    let effects = log.effects();
    assert_eq!(
        position(
            &effects,
            &Effect::SessionRequested {
                bot: 55,
                from_menu: true
            }
        ),
        Some(4)
    );
    assert!(effects.contains(&Effect::Load {
        url: "https://issued.example/start".to_string()
    }));

    assert_eq!(summary.query_id, Some(99));
    assert_eq!(summary.termination, Some(TerminationReason::KeepAliveCompleted));
    let completion = position(&effects, &Effect::Completion).unwrap();
    let dismiss = position(&effects, &Effect::Dismiss).unwrap();
    assert!(completion < dismiss);
}

#[tokio::test]
async fn test_keep_alive_error_dismisses_without_completion() {
    let steps =
        parse_transcript(r#"{"step":"keep_alive_error","message":"query expired"}"#).unwrap();

    let log = EffectLog::buffered();
    let summary = replay(&steps, pre_issued(None), HostConfig::default(), log.clone())
        .await
        .unwrap();

    assert_eq!(summary.termination, Some(TerminationReason::KeepAliveInvalidated));
    let effects = log.effects();
    assert_eq!(count(&effects, &Effect::Dismiss), 1);
    assert_eq!(count(&effects, &Effect::Completion), 0);
}

#[tokio::test]
async fn test_keyboard_opening_requests_expansion() {
    let steps = parse_transcript(
        r#"
        {"step":"layout","layout":{"size":{"width":390.0,"height":600.0}}}
        {"step":"layout","layout":{"size":{"width":390.0,"height":600.0},"input_height":300.0}}
        "#,
    )
    .unwrap();

    let log = EffectLog::buffered();
    replay(&steps, pre_issued(None), HostConfig::default(), log.clone())
        .await
        .unwrap();

    let effects = log.effects();
    let viewports = effects
        .iter()
        .filter(|e| matches!(e, Effect::Viewport { .. }))
        .count();
    assert_eq!(viewports, 2);
    assert_eq!(count(&effects, &Effect::Expand), 1);
}

#[tokio::test]
async fn test_navigation_interception_and_theme_change() {
    let steps = parse_transcript(
        r#"
        {"step":"navigate","url":"https://t.me/shopbot"}
        {"step":"navigate","url":"https://shop.example/next"}
        {"step":"theme","theme":"night"}
        {"step":"main_button_pressed"}
        "#,
    )
    .unwrap();

    let log = EffectLog::buffered();
    replay(&steps, pre_issued(None), HostConfig::default(), log.clone())
        .await
        .unwrap();

    let effects = log.effects();
    assert!(effects.contains(&Effect::Navigation {
        url: "https://t.me/shopbot".to_string(),
        intercepted: true,
    }));
    assert!(effects.contains(&Effect::OpenUrl {
        url: "https://t.me/shopbot".to_string()
    }));
    assert!(effects.contains(&Effect::Navigation {
        url: "https://shop.example/next".to_string(),
        intercepted: false,
    }));

    // Night plain background is black, so the block background stands in
    assert!(effects.contains(&Effect::Background {
        color: "#1c1c1d".to_string()
    }));

    let scripts: Vec<&String> = effects
        .iter()
        .filter_map(|e| match e {
            Effect::Script { script } => Some(script),
            _ => None,
        })
        .collect();
    assert_eq!(scripts.len(), 2);
    assert!(scripts[0].contains("\"theme_changed\""));
    assert!(scripts[0].contains("\"bg_color\": \"#1c1c1d\""));
    assert_eq!(
        scripts[1],
        "window.TelegramGameProxy && window.TelegramGameProxy.receiveEvent(\"main_button_pressed\", null)"
    );
}

#[tokio::test]
async fn test_content_revealed_after_navigation_settles() {
    let steps = parse_transcript(
        r#"
        {"step":"navigation_started"}
        {"step":"progress","value":0.5}
        {"step":"navigation_finished"}
        {"step":"wait","ms":60}
        "#,
    )
    .unwrap();
    let config = HostConfig {
        reveal_delay_ms: 10,
        ..Default::default()
    };

    let log = EffectLog::buffered();
    replay(&steps, pre_issued(None), config, log.clone())
        .await
        .unwrap();

    let effects = log.effects();
    assert!(effects.contains(&Effect::Progress { value: 0.5 }));
    assert!(effects.contains(&Effect::ContentVisible { visible: true }));
    assert!(effects.contains(&Effect::Placeholder { placeholder: None }));
}

#[tokio::test]
async fn test_transcript_read_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{{\"step\":\"scroll\",\"offset\":15.0}}").unwrap();
    writeln!(file, "{{\"step\":\"bridge\",\"message\":{{\"eventName\":\"web_app_close\"}}}}").unwrap();

    let reader = std::io::BufReader::new(std::fs::File::open(file.path()).unwrap());
    let steps = read_transcript(reader).unwrap();

    let log = EffectLog::buffered();
    let summary = replay(&steps, pre_issued(None), HostConfig::default(), log.clone())
        .await
        .unwrap();

    assert_eq!(summary.termination, Some(TerminationReason::Closed));
    assert!(log.effects().contains(&Effect::NavigationAlpha { alpha: 0.5 }));
}

#[tokio::test]
async fn test_remove_from_menu_then_skipped_open_bot() {
    let steps = parse_transcript("{\"step\":\"remove_from_menu\"}\n{\"step\":\"open_bot\"}\n").unwrap();
    let options = ReplayOptions {
        in_attach_menu: true,
        ..pre_issued(None)
    };

    let log = EffectLog::buffered();
    let summary = replay(&steps, options, HostConfig::default(), log.clone())
        .await
        .unwrap();

    assert_eq!(summary.termination, Some(TerminationReason::Closed));
    assert_eq!(summary.steps_skipped, 1);
    let effects = log.effects();
    let removed = position(&effects, &Effect::RemoveFromMenu { bot: 2 }).unwrap();
    let dismiss = position(&effects, &Effect::Dismiss).unwrap();
    assert!(removed < dismiss);
    assert_eq!(count(&effects, &Effect::OpenChat { peer: 2 }), 0);
}

#[tokio::test]
async fn test_open_bot_opens_chat_after_dismiss() {
    let steps = parse_transcript(r#"{"step":"open_bot"}"#).unwrap();

    let log = EffectLog::buffered();
    replay(&steps, pre_issued(None), HostConfig::default(), log.clone())
        .await
        .unwrap();

    let effects = log.effects();
    let dismiss = position(&effects, &Effect::Dismiss).unwrap();
    let chat = position(&effects, &Effect::OpenChat { peer: 2 }).unwrap();
    assert!(dismiss < chat);
}
