//! Subsystem integration tests: build → dispatch → tick → read through
//! the service façade.

use plant_common::config::{ConveyorProfile, FillerConfig, FillerProfile, LineConfig};
use plant_common::status::{ConveyorStatus, FillerStatus};
use plant_common::value::Value;
use plant_registry::{NodeKind, OpStatus, WriteRequest};
use plant_server::{BuildResult, ConveyorLineSubsystem, FillerSubsystem, UpdateRunner};
use std::time::Duration;

fn steady_line(count: u8) -> LineConfig {
    LineConfig {
        conveyor_count: count,
        update_interval_ms: 2000,
        profile: ConveyorProfile {
            alarm_probability: 0.0,
            bottle_probability: 1.0,
            ..ConveyorProfile::default()
        },
    }
}

fn steady_filler() -> FillerConfig {
    FillerConfig {
        update_interval_ms: 2000,
        profile: FillerProfile {
            alarm_probability: 0.0,
            run_probability: 1.0,
            bottle_probability: 1.0,
            ..FillerProfile::default()
        },
    }
}

#[test]
fn test_power_command_visible_before_derived_state() -> BuildResult<()> {
    let line = ConveyorLineSubsystem::build(&steady_line(3), 42)?;
    let service = line.service();

    let statuses =
        service.write_variables(&[WriteRequest::new("Conveyor2.Powered", Value::Bool(true))]);
    assert_eq!(statuses, vec![OpStatus::Good]);

    // The echoed command value reads back immediately; the derived
    // status only flips on the next update cycle.
    let read = service.read_variables(&[
        "Conveyor2.Powered".to_string(),
        "Conveyor2.Status".to_string(),
    ]);
    assert_eq!(read[0].value, Some(Value::Bool(true)));
    assert_eq!(
        read[1].value,
        Some(Value::Int32(ConveyorStatus::Off.as_i32()))
    );

    line.tick()?;
    let read = service.read_variables(&["Conveyor2.Status".to_string()]);
    assert_eq!(
        read[0].value,
        Some(Value::Int32(ConveyorStatus::Running.as_i32()))
    );
    Ok(())
}

#[test]
fn test_writes_to_simulation_owned_variables_rejected() -> BuildResult<()> {
    let line = ConveyorLineSubsystem::build(&steady_line(2), 1)?;
    let service = line.service();

    let statuses = service.write_variables(&[
        WriteRequest::new("Conveyor1.Status", Value::Int32(1)),
        WriteRequest::new("Conveyor1.PowerDraw", Value::Float(3.0)),
        WriteRequest::new("Conveyor1.BottleCount", Value::UInt32(999)),
    ]);
    assert_eq!(
        statuses,
        vec![
            OpStatus::NotWritable,
            OpStatus::NotWritable,
            OpStatus::NotWritable
        ]
    );
    Ok(())
}

#[test]
fn test_mixed_batch_reports_per_item_status_in_order() -> BuildResult<()> {
    let line = ConveyorLineSubsystem::build(&steady_line(2), 1)?;
    let service = line.service();

    let statuses = service.write_variables(&[
        WriteRequest::new("Conveyor1.Powered", Value::Bool(true)),
        WriteRequest::new("Conveyor1.Powered", Value::Int32(1)),
        WriteRequest::new("Conveyor9.Powered", Value::Bool(true)),
        WriteRequest::new("Conveyor2.Automatic", Value::Bool(false)),
    ]);
    assert_eq!(
        statuses,
        vec![
            OpStatus::Good,
            OpStatus::TypeMismatch,
            OpStatus::NotFound,
            OpStatus::Good
        ]
    );
    Ok(())
}

#[test]
fn test_recipe_selection_flow() -> BuildResult<()> {
    let filler = FillerSubsystem::build(&steady_filler(), 8)?;
    let service = filler.service();

    service.write_variables(&[WriteRequest::new("Filler.Powered", Value::Bool(true))]);

    let statuses = service.write_variables(&[
        WriteRequest::new("Filler.RecipeSelect", Value::String("Energy Drink".into())),
        WriteRequest::new("Filler.RecipeSelect", Value::String("Motor Oil".into())),
    ]);
    assert_eq!(statuses, vec![OpStatus::Good, OpStatus::UnknownRecipe]);

    filler.tick()?;
    let read = service.read_variables(&[
        "Filler.ActiveRecipe".to_string(),
        "Filler.Status".to_string(),
    ]);
    assert_eq!(read[0].value, Some(Value::String("Energy Drink".into())));
    assert_eq!(
        read[1].value,
        Some(Value::Int32(FillerStatus::Running.as_i32()))
    );
    Ok(())
}

#[test]
fn test_browse_exposes_the_expected_shape() -> BuildResult<()> {
    let line = ConveyorLineSubsystem::build(&steady_line(2), 1)?;
    let service = line.service();

    let units = service.browse(&service.root())?;
    assert_eq!(units.len(), 2);
    assert!(units.iter().all(|u| u.kind == NodeKind::Object));
    assert_eq!(units[0].name, "Conveyor1");

    let folders = service.browse(&units[0].node)?;
    let names: Vec<&str> = folders.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["Parameters", "Control", "Diagnostics"]);

    let parameters = service.browse(&folders[0].node)?;
    let names: Vec<&str> = parameters.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "Status",
            "Direction",
            "Mode",
            "PowerDraw",
            "BottleCount",
            "TargetSpeed"
        ]
    );
    assert!(parameters.iter().all(|v| v.kind == NodeKind::Variable));
    Ok(())
}

#[test]
fn test_diagnostics_track_power_cycles() -> BuildResult<()> {
    let line = ConveyorLineSubsystem::build(&steady_line(1), 3)?;
    let service = line.service();

    for _ in 0..3 {
        service.write_variables(&[WriteRequest::new("Conveyor1.Powered", Value::Bool(true))]);
        line.tick()?;
        service.write_variables(&[WriteRequest::new("Conveyor1.Powered", Value::Bool(false))]);
        line.tick()?;
    }

    let read = service.read_variables(&[
        "Conveyor1.StartCount".to_string(),
        "Conveyor1.RunningHours".to_string(),
    ]);
    assert_eq!(read[0].value, Some(Value::UInt32(3)));
    let hours = read[1].value.as_ref().and_then(Value::as_f64).unwrap_or(0.0);
    assert!(hours > 0.0);
    Ok(())
}

#[test]
fn test_runner_drives_production() -> BuildResult<()> {
    let mut config = steady_line(2);
    config.update_interval_ms = 20;
    let line = ConveyorLineSubsystem::build(&config, 9)?;
    let service = line.service();
    service.write_variables(&[WriteRequest::new("Conveyor1.Powered", Value::Bool(true))]);

    let runner = UpdateRunner::spawn("line_under_test", line.tick_interval(), {
        let line = line.clone();
        move || line.tick()
    });
    std::thread::sleep(Duration::from_millis(150));
    runner.stop();

    let read = service.read_variables(&["Conveyor1.BottleCount".to_string()]);
    let bottles = read[0].value.as_ref().and_then(Value::as_u32).unwrap_or(0);
    assert!(bottles >= 2, "expected steady production, got {bottles}");
    Ok(())
}
