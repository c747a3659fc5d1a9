//! Tests for the achievement runtime

use super::*;
use crate::memory::MemoryBlock;

const RAM: [u8; 5] = [0x00, 0x12, 0x34, 0xAB, 0x56];

fn achievement(id: u32, trigger: &str) -> AchievementEntry {
    AchievementEntry {
        id,
        title: format!("Achievement {id}"),
        trigger: trigger.to_string(),
    }
}

fn leaderboard(id: u32, format: &str, script: &str) -> LeaderboardEntry {
    LeaderboardEntry {
        id,
        title: format!("Leaderboard {id}"),
        format: format.to_string(),
        script: script.to_string(),
    }
}

fn runtime(set: &AchievementSet) -> Runtime {
    let mut runtime = Runtime::new(RuntimeConfig::default());
    let report = runtime.load(set);
    assert!(report.is_clean(), "{report:?}");
    runtime
}

fn frame(runtime: &mut Runtime, ram: &[u8]) -> Vec<Event> {
    runtime.do_frame(&mut MemoryBlock::new(ram))
}

// =============================================================
// Achievements
// =============================================================

#[test]
fn test_achievement_must_be_false_first() {
    let mut ram = RAM;
    let mut rt = runtime(&AchievementSet {
        achievements: vec![achievement(1, "0xH01=18")],
        ..Default::default()
    });

    // true from the first frame: never fires
    assert!(frame(&mut rt, &ram).is_empty());
    assert!(frame(&mut rt, &ram).is_empty());

    ram[1] = 0;
    assert!(frame(&mut rt, &ram).is_empty());

    ram[1] = 0x12;
    assert_eq!(frame(&mut rt, &ram), [Event::AchievementTriggered { id: 1 }]);
    assert_eq!(rt.is_achievement_active(1), Some(false));

    // fires once
    ram[1] = 0;
    frame(&mut rt, &ram);
    ram[1] = 0x12;
    assert!(frame(&mut rt, &ram).is_empty());
}

#[test]
fn test_waiting_discards_hits() {
    let mut rt = runtime(&AchievementSet {
        achievements: vec![achievement(1, "0xH01=18(2)")],
        ..Default::default()
    });

    // the first hit lands while waiting and is reset
    assert!(frame(&mut rt, &RAM).is_empty());
    assert!(frame(&mut rt, &RAM).is_empty());
    assert_eq!(frame(&mut rt, &RAM), [Event::AchievementTriggered { id: 1 }]);
}

#[test]
fn test_achievement_without_false_requirement() {
    let config = RuntimeConfig {
        require_false_before_trigger: false,
        ..Default::default()
    };
    let mut rt = Runtime::new(config);
    rt.load(&AchievementSet {
        achievements: vec![achievement(7, "0xH02=52")],
        ..Default::default()
    });
    assert_eq!(frame(&mut rt, &RAM), [Event::AchievementTriggered { id: 7 }]);
    assert_eq!(rt.active_achievements().count(), 0);
}

#[test]
fn test_measured_progress() {
    let mut rt = runtime(&AchievementSet {
        achievements: vec![achievement(3, "M:0xH01=18(5)")],
        ..Default::default()
    });
    let mut ram = RAM;
    ram[1] = 0;
    frame(&mut rt, &ram);
    ram[1] = 0x12;
    frame(&mut rt, &ram);
    frame(&mut rt, &ram);
    assert_eq!(rt.measured(3), Some((2, 5)));
    assert_eq!(rt.measured(99), None);
}

// =============================================================
// Leaderboards
// =============================================================

#[test]
fn test_leaderboard_events() {
    let mut ram = RAM;
    let mut rt = runtime(&AchievementSet {
        leaderboards: vec![leaderboard(
            10,
            "SCORE",
            "STA:0xH00=1::CAN:0xH00=2::SUB:0xH00=3::VAL:0xH02",
        )],
        ..Default::default()
    });

    assert!(frame(&mut rt, &ram).is_empty());

    ram[0] = 1;
    assert_eq!(frame(&mut rt, &ram), [Event::LeaderboardStarted { id: 10 }]);
    assert_eq!(rt.is_leaderboard_active(10), Some(true));

    ram[0] = 2;
    assert_eq!(frame(&mut rt, &ram), [Event::LeaderboardCanceled { id: 10 }]);

    // start must be seen false before another attempt
    ram[0] = 0;
    assert!(frame(&mut rt, &ram).is_empty());

    ram[0] = 1;
    assert_eq!(frame(&mut rt, &ram), [Event::LeaderboardStarted { id: 10 }]);

    ram[0] = 3;
    assert_eq!(
        frame(&mut rt, &ram),
        [Event::LeaderboardSubmitted {
            id: 10,
            value: 0x34,
            formatted: "000052 Points".to_string(),
        }]
    );
}

#[test]
fn test_zero_submission_is_rejected() {
    let mut ram = RAM;
    let script = "STA:0xH00=1::CAN:0xH00=2::SUB:0xH00=3::VAL:0xH02";
    let set = AchievementSet {
        leaderboards: vec![leaderboard(10, "VALUE", script)],
        ..Default::default()
    };

    let mut rt = runtime(&set);
    ram[0] = 1;
    frame(&mut rt, &ram);
    ram[0] = 3;
    ram[2] = 0;
    assert_eq!(frame(&mut rt, &ram), [Event::LeaderboardCanceled { id: 10 }]);

    let config = RuntimeConfig {
        reject_zero_submissions: false,
        ..Default::default()
    };
    let mut rt = Runtime::new(config);
    rt.load(&set);
    ram[0] = 1;
    frame(&mut rt, &ram);
    ram[0] = 3;
    assert_eq!(
        frame(&mut rt, &ram),
        [Event::LeaderboardSubmitted {
            id: 10,
            value: 0,
            formatted: "0".to_string(),
        }]
    );
}

#[test]
fn test_frames_format_uses_configured_rate() {
    let config = RuntimeConfig {
        fps: 30,
        ..Default::default()
    };
    let mut rt = Runtime::new(config);
    rt.load(&AchievementSet {
        leaderboards: vec![leaderboard(
            4,
            "FRAMES",
            "STA:0xH00=0::CAN:0xH00=2::SUB:0xH01=18::VAL:0xH01",
        )],
        ..Default::default()
    });
    // submit already holds on the start frame
    assert_eq!(
        frame(&mut rt, &RAM),
        [Event::LeaderboardSubmitted {
            id: 4,
            value: 18,
            formatted: "00:00.60".to_string(),
        }]
    );
    assert!(frame(&mut rt, &RAM).is_empty());
}

// =============================================================
// Reset, rich presence, load failures
// =============================================================

#[test]
fn test_reset_game() {
    let mut ram = RAM;
    let mut rt = runtime(&AchievementSet {
        achievements: vec![achievement(1, "0xH00=1")],
        leaderboards: vec![leaderboard(
            2,
            "VALUE",
            "STA:0xH01=18::CAN:0xH01=0::SUB:0xH00=3::VAL:0xH02",
        )],
        ..Default::default()
    });

    // achievement becomes eligible, leaderboard starts
    assert_eq!(frame(&mut rt, &ram), [Event::LeaderboardStarted { id: 2 }]);

    rt.reset_game();
    assert_eq!(rt.is_leaderboard_active(2), Some(false));

    // start is still true: no restart. The achievement waits again.
    ram[0] = 1;
    assert!(frame(&mut rt, &ram).is_empty());

    ram[0] = 0;
    ram[1] = 0x13;
    assert!(frame(&mut rt, &ram).is_empty());

    ram[0] = 1;
    ram[1] = 0x12;
    assert_eq!(
        frame(&mut rt, &ram),
        [
            Event::AchievementTriggered { id: 1 },
            Event::LeaderboardStarted { id: 2 },
        ]
    );
}

#[test]
fn test_rich_presence_is_truncated() {
    let set = AchievementSet {
        rich_presence: Some("Display:\n?0xH00=0?In the menus\nPlaying".to_string()),
        ..Default::default()
    };
    let mut rt = runtime(&set);
    assert_eq!(rt.rich_presence(&mut MemoryBlock::new(&RAM)).as_deref(), Some("In the menus"));

    let config = RuntimeConfig {
        rich_presence_max_len: 5,
        ..Default::default()
    };
    let mut rt = Runtime::new(config);
    rt.load(&set);
    assert_eq!(rt.rich_presence(&mut MemoryBlock::new(&RAM)).as_deref(), Some("In th"));

    let mut empty = Runtime::new(RuntimeConfig::default());
    assert_eq!(empty.rich_presence(&mut MemoryBlock::new(&RAM)), None);
}

#[test]
fn test_bad_scripts_are_skipped() {
    let set = AchievementSet {
        achievements: vec![achievement(1, "0xH01=18"), achievement(2, "0xH01=Z")],
        leaderboards: vec![leaderboard(3, "VALUE", "STA:0=0::CAN:0=1")],
        rich_presence: Some("Display:".to_string()),
    };
    let mut rt = Runtime::new(RuntimeConfig::default());
    let report = rt.load(&set);

    assert_eq!(report.achievements, 1);
    assert_eq!(report.leaderboards, 0);
    assert!(!report.rich_presence);
    assert_eq!(
        report.failures,
        [
            LoadFailure {
                kind: ScriptKind::Achievement,
                id: 2,
                error: Error::InvalidMemoryOperand,
            },
            LoadFailure {
                kind: ScriptKind::Leaderboard,
                id: 3,
                error: Error::MissingSubmit,
            },
            LoadFailure {
                kind: ScriptKind::RichPresence,
                id: 0,
                error: Error::MissingDisplayString,
            },
        ]
    );
    assert_eq!(rt.achievement_count(), 1);
    assert_eq!(rt.is_achievement_active(2), None);
}

#[test]
fn test_snapshot_restore() {
    let mut ram = RAM;
    let mut rt = runtime(&AchievementSet {
        achievements: vec![achievement(1, "0xH01=18(2)")],
        ..Default::default()
    });

    ram[1] = 0;
    frame(&mut rt, &ram);
    ram[1] = 0x12;
    frame(&mut rt, &ram);
    let snapshot = rt.snapshot();

    assert_eq!(frame(&mut rt, &ram), [Event::AchievementTriggered { id: 1 }]);

    rt.restore(&snapshot).unwrap();
    assert_eq!(rt.is_achievement_active(1), Some(true));
    assert_eq!(frame(&mut rt, &ram), [Event::AchievementTriggered { id: 1 }]);
}

#[test]
fn test_restore_rejects_other_set() {
    let mut rt = runtime(&AchievementSet {
        achievements: vec![achievement(1, "0xH01=18")],
        ..Default::default()
    });
    let snapshot = rt.snapshot();

    rt.load(&AchievementSet::default());
    assert_eq!(rt.restore(&snapshot), Err(Error::InvalidState));

    rt.load(&AchievementSet {
        achievements: vec![achievement(1, "0xH01=18_0xH02=52")],
        ..Default::default()
    });
    assert_eq!(rt.restore(&snapshot), Err(Error::InvalidState));
}
