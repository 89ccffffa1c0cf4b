//! User-Friendly Error Formatting
//!
//! Turns a fatal error into a boxed message with troubleshooting hints.

use std::fmt::Write;

use crate::error::ForesightError;

/// Format error for user consumption
///
/// Classifies by the first [`ForesightError`] in the chain, falling back to
/// the message text for config and scenario loading errors.
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "╔════════════════════════════════════════════════════════════╗"
    )
    .ok();
    writeln!(
        &mut output,
        "║                     ERROR                                  ║"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();
    writeln!(&mut output).ok();

    let error_msg = error.to_string();
    let foresight_error = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<ForesightError>());

    match foresight_error {
        Some(ForesightError::DuplicateKey(key)) => format_duplicate_error(&mut output, key),
        Some(ForesightError::InvalidRadius(_) | ForesightError::InvalidDebounce) => {
            format_config_error(&mut output)
        }
        _ if error_msg.contains("scenario") => format_scenario_error(&mut output),
        _ if error_msg.contains("config") => format_config_error(&mut output),
        _ => format_generic_error(&mut output, &error_msg),
    }

    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Technical Details:").ok();
    writeln!(&mut output).ok();
    writeln!(&mut output, "{:#}", error).ok();
    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Need Help?").ok();
    writeln!(
        &mut output,
        "  - Run with --verbose for detailed logs: foresight-replay -vv"
    )
    .ok();
    writeln!(
        &mut output,
        "  - Override filtering: RUST_LOG=foresight=trace"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();

    output
}

fn format_config_error(output: &mut String) {
    writeln!(output, "Configuration Error").ok();
    writeln!(output).ok();
    writeln!(output, "Problem with the foresight configuration.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Configuration file not found").ok();
    writeln!(output, "     → Specify: foresight-replay -c /path/to/foresight.toml").ok();
    writeln!(output, "     → Or omit --config to run with defaults").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Invalid TOML syntax").ok();
    writeln!(output, "     → Check for typos, missing quotes, etc.").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Value out of range").ok();
    writeln!(output, "     → [foresight] radius must be finite and > 0").ok();
    writeln!(output, "     → [foresight] debounce_ms must be > 0").ok();
    writeln!(output, "     → mode is 'single' or 'multiple'").ok();
    writeln!(output, "     → geometry is 'available' or 'unavailable'").ok();
}

fn format_scenario_error(output: &mut String) {
    writeln!(output, "Scenario Error").ok();
    writeln!(output).ok();
    writeln!(output, "Could not load the pointer scenario.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Scenario file not found").ok();
    writeln!(output, "     → Check the path given to --scenario").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Invalid JSON layout").ok();
    writeln!(
        output,
        "     → targets: [{{ \"key\": ..., \"rect\": {{ left, top, right, bottom }} | null }}]"
    )
    .ok();
    writeln!(
        output,
        "     → samples: [{{ \"x\": ..., \"y\": ..., \"delay_ms\": ... }}]"
    )
    .ok();
    writeln!(output, "     → Omit x/y for a pointer-leave sample").ok();
}

fn format_duplicate_error(output: &mut String, key: &str) {
    writeln!(output, "Duplicate Prefetch Key").ok();
    writeln!(output).ok();
    writeln!(output, "The key '{}' was registered more than once.", key).ok();
    writeln!(output).ok();
    writeln!(output, "Troubleshooting:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Every scenario target needs a unique key").ok();
    writeln!(output, "     → Or set \"register\": false on the extra ones").ok();
}

fn format_generic_error(output: &mut String, error: &str) {
    writeln!(output, "Replay Error").ok();
    writeln!(output).ok();
    writeln!(output, "An error occurred while replaying the scenario.").ok();
    writeln!(output).ok();
    writeln!(output, "Error: {}", error).ok();
}
