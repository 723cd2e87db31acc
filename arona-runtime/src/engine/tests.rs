//! # Engine 测试

use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::actor::Actor;
use crate::script::{BgmAction, FadeColor, FadeDirection, Parser};
use crate::sprite::{Texture, test_sprite};

const METADATA: &str = r#"{
    "actors": { "mika": { "center_x": -0.5, "center_y": -0.65, "faction_name": "Tea Party" } },
    "animations": { "enter_left": { "speed": 0.05, "frames": [{ "x": -2.0 }, { "center": true }] } },
    "emotes": { "heart": { "type": "head" }, "sweat": {} }
}"#;

fn engine(text: &str) -> Engine {
    let script = Parser::new().parse("test", text);
    let metadata = Metadata::from_json(METADATA).unwrap();
    let mut engine = Engine::new(script, metadata, EngineConfig::default());
    register_mika(&mut engine);
    engine
}

fn register_mika(engine: &mut Engine) {
    let meta = engine.metadata().actor("mika").cloned().unwrap();
    let actor = Actor::from_metadata("mika", &meta);
    actor.load_texture("01", Texture::new("actor/mika/mika-01.png", 512, 1024));
    actor.load_texture("02", Texture::new("actor/mika/mika-02.png", 512, 1024));
    engine.session_mut().register_actor(actor);
}

fn reveal_ticket(commands: &[Command]) -> Ticket {
    commands
        .iter()
        .find_map(|c| match c {
            Command::RevealDialogue { ticket } => Some(*ticket),
            _ => None,
        })
        .expect("没有 RevealDialogue")
}

fn scheduled(commands: &[Command]) -> (Duration, Ticket) {
    commands
        .iter()
        .find_map(|c| match c {
            Command::ScheduleSignal { after, ticket } => Some((*after, *ticket)),
            _ => None,
        })
        .expect("没有 ScheduleSignal")
}

#[test]
fn test_engine_starts_loading_and_ignores_advance() {
    let mut engine = engine("[mika - 01 - _]\nHello.");
    assert_eq!(engine.state(), TurnState::Loading);
    assert!(engine.advance().unwrap().is_empty());
    assert_eq!(engine.session().cursor, None);
}

#[test]
fn test_simple_line() {
    let mut engine = engine("[mika - 01 - _]\nHello.");
    let commands = engine.finish_loading().unwrap();

    assert_eq!(commands.len(), 1);
    assert!(matches!(commands[0], Command::RevealDialogue { .. }));
    assert_eq!(engine.state(), TurnState::Idle);

    let session = engine.session();
    assert_eq!(session.speaker.as_deref(), Some("mika"));
    assert_eq!(session.name_label.as_deref(), Some("Mika"));
    assert_eq!(session.faction_label.as_deref(), Some("Tea Party"));
    assert_eq!(session.stage, vec!["mika"]);
    assert_eq!(session.dialogue.as_ref().unwrap().full_text(), "Hello.");
    assert_eq!(
        session.actor("mika").unwrap().active_texture().as_deref(),
        Some("01")
    );
}

#[test]
fn test_synchronous_background_chains_into_next_line() {
    let mut engine = engine("[bg - sunset - _]\n[mika - 01 - _]\nHi.");
    engine
        .session_mut()
        .resources
        .backgrounds
        .insert("sunset".to_string(), Texture::new("bg/sunset.jpeg", 1280, 720));

    let commands = engine.finish_loading().unwrap();
    assert_eq!(
        commands[0],
        Command::ShowBackground {
            key: "sunset".to_string()
        }
    );
    assert!(matches!(commands[1], Command::RevealDialogue { .. }));
    assert_eq!(commands.len(), 2);
    assert_eq!(engine.session().cursor, Some(1));
    assert_eq!(engine.session().background.as_deref(), Some("sunset"));
}

#[test]
fn test_missing_background_reports_debug_message() {
    let mut engine = engine("[bg - nowhere - _]");
    let commands = engine.finish_loading().unwrap();
    assert!(matches!(&commands[0], Command::Debug { message } if message.contains("nowhere")));
    assert!(engine.is_finished());
}

#[test]
fn test_two_choice_branch() {
    let mut engine = engine("[mika - 01 - _]\nTea?\n[sensei - _ - _]\nYes\nNo\n[mika - 02 - _]\nGood.");
    engine.finish_loading().unwrap();

    let commands = engine.advance().unwrap();
    assert_eq!(commands, vec![Command::PresentReplies]);
    assert_eq!(engine.state(), TurnState::WaitingConfirmation);
    assert_eq!(engine.session().replies.len(), 2);
    assert!(engine.session().replies.iter().all(|r| r.interactive));

    // 确认前的推进全部被忽略
    assert!(engine.advance().unwrap().is_empty());
    assert!(engine.advance().unwrap().is_empty());
    assert_eq!(engine.session().cursor, Some(1));

    engine.confirm_reply(1).unwrap();
    assert_eq!(engine.state(), TurnState::Idle);
    assert_eq!(engine.session().chosen_reply, Some(1));

    let commands = engine.advance().unwrap();
    assert_eq!(commands[0], Command::DismissReplies);
    assert!(matches!(commands[1], Command::RevealDialogue { .. }));
    assert!(engine.session().replies.is_empty());
    assert_eq!(engine.session().dismissed_replies.len(), 2);
    assert_eq!(
        engine.session().actor("mika").unwrap().active_texture().as_deref(),
        Some("02")
    );
}

#[test]
fn test_single_reply_is_confirmed_by_timer() {
    let mut engine = engine("[sensei - _ - _]\n...Okay.\n[mika - 01 - _]\nThen let's go.");
    let commands = engine.finish_loading().unwrap();
    assert_eq!(commands[0], Command::PresentReplies);
    let (after, ticket) = scheduled(&commands);
    assert_eq!(after, Duration::from_secs(2));
    assert_eq!(engine.state(), TurnState::WaitingConfirmation);

    let commands = engine.handle_signal(Signal::Completed(ticket)).unwrap();
    assert_eq!(engine.session().chosen_reply, Some(0));
    assert_eq!(commands[0], Command::DismissReplies);
    assert_eq!(engine.state(), TurnState::Idle);
    assert_eq!(engine.session().cursor, Some(1));
}

#[test]
fn test_confirm_reply_errors() {
    let mut engine = engine("[mika - 01 - _]\nHi.\n[sensei - _ - _]\nYes\nNo");
    engine.finish_loading().unwrap();
    assert!(matches!(
        engine.confirm_reply(0),
        Err(RuntimeError::StateMismatch { .. })
    ));

    engine.advance().unwrap();
    assert_eq!(
        engine.confirm_reply(2),
        Err(RuntimeError::InvalidReplyIndex { index: 2, max: 2 })
    );
    assert_eq!(engine.state(), TurnState::WaitingConfirmation);
}

#[test]
fn test_cursor_never_decreases_and_stops_at_end() {
    let mut engine = engine("[mika - 01 - _]\nA.\n[mika - 02 - _]\nB.");
    engine.finish_loading().unwrap();

    let mut last = engine.session().cursor;
    for _ in 0..5 {
        engine.advance().unwrap();
        let cursor = engine.session().cursor;
        assert!(cursor >= last);
        last = cursor;
    }
    assert!(engine.is_finished());
    assert_eq!(engine.session().cursor, Some(2));
    assert!(engine.advance().unwrap().is_empty());
}

#[test]
fn test_delay_waits_for_matching_signal() {
    let mut engine = engine("[delay - _ - 2]\n[mika - 01 - _]\nHi.");
    let commands = engine.finish_loading().unwrap();
    let (after, ticket) = scheduled(&commands);
    assert_eq!(after, Duration::from_secs(2));
    assert_eq!(engine.session().cursor, Some(0));

    // 过期的凭据不推进
    let stale = Ticket(ticket.0 + 100);
    assert!(engine.handle_signal(Signal::Completed(stale)).unwrap().is_empty());
    assert_eq!(engine.session().cursor, Some(0));

    let commands = engine.handle_signal(Signal::Completed(ticket)).unwrap();
    assert!(matches!(commands[0], Command::RevealDialogue { .. }));
    assert_eq!(engine.session().cursor, Some(1));

    // 同一凭据只生效一次
    assert!(engine.handle_signal(Signal::Completed(ticket)).unwrap().is_empty());
}

#[test]
fn test_click_during_wait_makes_signal_stale() {
    let mut engine = engine("[fade - out - white]\n[mika - 01 - _]\nHi.\n[mika - 02 - _]\nBye.");
    let commands = engine.finish_loading().unwrap();
    let ticket = match commands[0] {
        Command::SceneFade {
            direction: FadeDirection::Out,
            color: FadeColor::White,
            ticket,
        } => ticket,
        ref other => panic!("unexpected {:?}", other),
    };

    engine.advance().unwrap();
    assert_eq!(engine.session().cursor, Some(1));
    assert!(engine.handle_signal(Signal::Completed(ticket)).unwrap().is_empty());
    assert_eq!(engine.session().cursor, Some(1));
}

#[test]
fn test_emote_without_dialogue_waits_for_duration() {
    let mut engine = engine("[mika - emote - heart]\n[mika - 01 - _]\nHi.");
    engine
        .session_mut()
        .resources
        .emotes
        .insert("heart".to_string(), Arc::new(test_sprite("heart", &[100, 200])));
    engine.session_mut().resources.sounds.insert("heart".to_string());

    let commands = engine.finish_loading().unwrap();
    assert_eq!(
        commands[0],
        Command::StartEmote {
            actor: "mika".to_string(),
            emote: "heart".to_string(),
            with_sound: true,
        }
    );
    let (after, ticket) = scheduled(&commands);
    assert_eq!(after, Duration::from_millis(300));

    engine.handle_signal(Signal::Completed(ticket)).unwrap();
    assert_eq!(engine.session().cursor, Some(1));
}

#[test]
fn test_unknown_emote_is_fatal() {
    let mut engine = engine("[mika - emote - blush]");
    assert_eq!(
        engine.finish_loading(),
        Err(RuntimeError::UnknownEmote {
            name: "blush".to_string()
        })
    );
}

#[test]
fn test_declared_but_unloaded_emote_is_reported() {
    let mut engine = engine("[mika - emote - sweat]\nHm.");
    let commands = engine.finish_loading().unwrap();
    assert!(
        commands
            .iter()
            .any(|c| matches!(c, Command::Debug { message } if message.contains("sweat")))
    );
    assert_eq!(engine.state(), TurnState::Idle);
}

#[test]
fn test_animation_without_dialogue_waits() {
    let mut engine = engine("[mika - 01 - enter_left]\n[mika - 02 - _]\nHi.");
    let commands = engine.finish_loading().unwrap();
    let ticket = match &commands[0] {
        Command::AnimateActor {
            actor,
            animation,
            ticket: Some(ticket),
        } => {
            assert_eq!(actor, "mika");
            assert_eq!(animation, "enter_left");
            *ticket
        }
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!(engine.session().cursor, Some(0));

    engine.handle_signal(Signal::Completed(ticket)).unwrap();
    assert_eq!(engine.session().cursor, Some(1));
}

#[test]
fn test_async_animation_chains_immediately() {
    let mut engine = engine("[mika - 01 - enter_left_async]\n[bgm - aoharu - _]");
    engine.session_mut().resources.music.insert("aoharu".to_string());

    let commands = engine.finish_loading().unwrap();
    assert_eq!(
        commands,
        vec![
            Command::AnimateActor {
                actor: "mika".to_string(),
                animation: "enter_left".to_string(),
                ticket: None,
            },
            Command::Bgm {
                key: "aoharu".to_string(),
                action: BgmAction::Play,
            },
        ]
    );
    assert!(engine.is_finished());
}

#[test]
fn test_unregistered_animation_is_skipped() {
    let mut engine = engine("[mika - 01 - moonwalk]\n[mika - 02 - _]\nHi.");
    let commands = engine.finish_loading().unwrap();
    assert_eq!(commands.len(), 1);
    assert!(matches!(commands[0], Command::RevealDialogue { .. }));
}

#[test]
fn test_missing_texture_goes_to_debug_channel() {
    let mut engine = engine("[mika - 09 - _]\nHi.");
    let commands = engine.finish_loading().unwrap();
    assert!(
        commands
            .iter()
            .any(|c| matches!(c, Command::Debug { message } if message.contains("09")))
    );
    assert_eq!(engine.state(), TurnState::Idle);
}

#[test]
fn test_unregistered_speaker_has_no_visual_effect() {
    let mut engine = engine("[momoi - 01 - _]\nHey!");
    let commands = engine.finish_loading().unwrap();
    assert_eq!(commands.len(), 1);
    assert!(engine.session().stage.is_empty());
    assert_eq!(engine.session().name_label.as_deref(), Some("Momoi"));
}

#[test]
fn test_off_screen_speaker_is_not_added_to_stage() {
    let mut engine = engine("[mika - _ - _]\nFrom behind the door.");
    engine.finish_loading().unwrap();
    assert!(engine.session().stage.is_empty());
    assert_eq!(engine.session().speaker.as_deref(), Some("mika"));
}

#[test]
fn test_auto_advance_after_reveal() {
    let mut engine = engine("[mika - 01 - _]\nA.\n[mika - 02 - _]\nB.");
    let commands = engine.finish_loading().unwrap();
    let reveal = reveal_ticket(&commands);

    // 关闭时不安排
    assert!(engine.handle_signal(Signal::RevealFinished(reveal)).unwrap().is_empty());

    engine.session().dialogue.as_ref().unwrap().complete();
    let commands = engine.set_auto_advance(true);
    let (after, ticket) = scheduled(&commands);
    assert_eq!(after, Duration::from_secs(1));

    engine.handle_signal(Signal::Completed(ticket)).unwrap();
    assert_eq!(engine.session().cursor, Some(1));
}

#[test]
fn test_stale_reveal_does_not_schedule() {
    let mut engine = engine("[mika - 01 - _]\nA.\n[mika - 02 - _]\nB.");
    engine.session_mut().auto_advance = true;
    let commands = engine.finish_loading().unwrap();
    let old = reveal_ticket(&commands);

    let commands = engine.advance().unwrap();
    let current = reveal_ticket(&commands);
    assert!(engine.handle_signal(Signal::RevealFinished(old)).unwrap().is_empty());
    assert_eq!(engine.handle_signal(Signal::RevealFinished(current)).unwrap().len(), 1);
}

#[test]
fn test_clone_and_all_emote() {
    let mut engine = engine(
        "[clone - mika - mika_past]\n[mika - 01 - _]\n[mika_past - 02 - _]\n[all - emote - heart]",
    );
    engine
        .session_mut()
        .resources
        .emotes
        .insert("heart".to_string(), Arc::new(test_sprite("heart", &[100])));

    let commands = engine.finish_loading().unwrap();
    let emotes: Vec<&str> = commands
        .iter()
        .filter_map(|c| match c {
            Command::StartEmote { actor, .. } => Some(actor.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(emotes, vec!["mika", "mika_past"]);
    assert_eq!(engine.session().stage, vec!["mika", "mika_past"]);
    assert_eq!(engine.session().name_label, None);

    let copy = engine.session().actor("mika_past").unwrap();
    assert_eq!(copy.label(), "Mika Past");
    assert_eq!(copy.active_texture().as_deref(), Some("02"));
    assert_eq!(
        engine.session().actor("mika").unwrap().active_texture().as_deref(),
        Some("01")
    );
}

#[test]
fn test_defect_replaces_registered_faction() {
    let mut engine = engine("[defect - mika - Gehenna]\n[mika - 01 - _]\nHi.");
    engine.finish_loading().unwrap();
    assert_eq!(engine.session().faction_label.as_deref(), Some("Gehenna"));
}

#[test]
fn test_clear_and_font_directives() {
    let mut engine = engine("[mika - 01 - _]\nA.\n[font - size - 1.5]\n[clear - _ - _]\n[mika - 02 - _]\nB.\n[font - size - reset]");
    engine.finish_loading().unwrap();

    let commands = engine.advance().unwrap();
    assert!(commands.contains(&Command::ClearStage));
    assert_eq!(engine.session().font_scale, 1.5);
    assert_eq!(engine.session().stage, vec!["mika"]);

    engine.advance().unwrap();
    assert_eq!(engine.session().font_scale, 0.85);
}

#[test]
fn test_reload_resets_session_and_expires_signals() {
    let mut engine = engine("[delay - _ - 1]\n[mika - 01 - _]\nHi.");
    let commands = engine.finish_loading().unwrap();
    let (_, ticket) = scheduled(&commands);

    let script = Parser::new().parse("test", "[mika - 01 - _]\nAgain.");
    let metadata = engine.metadata().clone();
    engine.reload(script, metadata);
    assert_eq!(engine.state(), TurnState::Loading);
    assert!(engine.session().actors.is_empty());
    assert_eq!(engine.session().cursor, None);

    register_mika(&mut engine);
    engine.finish_loading().unwrap();
    assert!(engine.handle_signal(Signal::Completed(ticket)).unwrap().is_empty());
    assert_eq!(engine.session().cursor, Some(0));
}

#[test]
fn test_reload_restores_volume_and_overlay_defaults() {
    let mut engine = engine("[mika - 01 - _]\nHi.");
    engine.finish_loading().unwrap();
    let session = engine.session_mut();
    session.bgm_volume = -3.0;
    session.sfx_volume = -2.0;
    session.debug_overlay = true;

    let script = engine.script().clone();
    let metadata = engine.metadata().clone();
    engine.reload(script, metadata);

    let defaults = SessionDefaults::default();
    let session = engine.session();
    assert_eq!(session.bgm_volume, defaults.bgm_volume);
    assert_eq!(session.sfx_volume, defaults.sfx_volume);
    assert_eq!(session.debug_overlay, defaults.debug_overlay);
}
