//! Runtime tests driven from set and config files on disk.

use std::io::Write;

use nether_cheevos::{AchievementSet, Event, MemoryBlock, Runtime, RuntimeConfig};

const SET: &str = r#"
rich_presence = """
Lookup:Stage
0=Title
1-3=Forest
*=Unknown

Display:
?0xH0000=0?In the menus
Stage @Stage(0xH0000)
"""

[[achievement]]
id = 1
title = "Warm Up"
trigger = "0xH0001=18(2)_0xH0002=52_R:0xL0004=4"

[[achievement]]
id = 2
title = "Broken"
trigger = "0xH0001=?"

[[leaderboard]]
id = 100
title = "Stage Time"
format = "FRAMES"
script = "STA:0xH0000=1::CAN:0xH0000=0::SUB:0xH0000=2::VAL:0xH0003"
"#;

fn frame(runtime: &mut Runtime, ram: &[u8]) -> Vec<Event> {
    runtime.do_frame(&mut MemoryBlock::new(ram))
}

fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_run_set_from_files() {
    let set_file = write_temp(SET);
    let config_file = write_temp("fps = 60\nrich_presence_max_len = 64\n");

    let set = AchievementSet::load(set_file.path()).unwrap();
    let config = RuntimeConfig::load(config_file.path()).unwrap();
    let mut runtime = Runtime::new(config);

    let report = runtime.load(&set);
    assert_eq!(report.achievements, 1);
    assert_eq!(report.leaderboards, 1);
    assert!(report.rich_presence);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, 2);

    let mut ram = [0x00, 0x12, 0x34, 0xAB, 0x56];
    // achievement 1 is false on its first frame (one hit of two)
    assert!(frame(&mut runtime, &ram).is_empty());
    assert!(frame(&mut runtime, &ram).is_empty());
    assert_eq!(frame(&mut runtime, &ram), [Event::AchievementTriggered { id: 1 }]);
    assert_eq!(
        runtime.rich_presence(&mut MemoryBlock::new(&ram)).as_deref(),
        Some("In the menus")
    );

    ram[0] = 1;
    assert_eq!(frame(&mut runtime, &ram), [Event::LeaderboardStarted { id: 100 }]);
    assert_eq!(
        runtime.rich_presence(&mut MemoryBlock::new(&ram)).as_deref(),
        Some("Stage Forest")
    );

    ram[0] = 2;
    assert_eq!(
        frame(&mut runtime, &ram),
        [Event::LeaderboardSubmitted {
            id: 100,
            value: 0xAB,
            formatted: "00:02.85".to_string(),
        }]
    );
}

#[test]
fn test_events_serialize_as_tagged_json() {
    let event = Event::LeaderboardSubmitted {
        id: 5,
        value: 120,
        formatted: "00:02.00".to_string(),
    };
    let json = serde_json::to_string(&event).unwrap();
    assert_eq!(
        json,
        r#"{"event":"leaderboard_submitted","id":5,"value":120,"formatted":"00:02.00"}"#
    );
}
