//! GRBL 1.1 error and alarm codes

/// Human-readable meaning of an `error:N` acknowledgment
pub fn describe_error(code: u8) -> &'static str {
    match code {
        1 => "Expected command letter",
        2 => "Bad number format",
        3 => "Invalid '$' system command",
        4 => "Negative value",
        5 => "Homing not enabled",
        6 => "Step pulse time must be at least 3 microseconds",
        7 => "EEPROM read failed, settings restored to defaults",
        8 => "'$' command requires the controller to be idle",
        9 => "G-code locked out during alarm or jog state",
        10 => "Soft limits require homing to be enabled",
        11 => "Line exceeds maximum length, not executed",
        12 => "Setting exceeds maximum step rate",
        13 => "Safety door opened",
        14 => "Build info or startup line too long",
        15 => "Jog target exceeds machine travel",
        16 => "Invalid jog command",
        17 => "Laser mode requires PWM output",
        20 => "Unsupported or invalid G-code command",
        21 => "More than one command from the same modal group",
        22 => "Feed rate not set",
        23 => "Command requires an integer value",
        24 => "More than one command requiring axis words",
        25 => "Repeated G-code word",
        26 => "No axis words found in block",
        27 => "Line number out of range",
        28 => "Missing required P or L value",
        29 => "Unsupported work coordinate system",
        30 => "G53 requires G0 or G1 motion mode",
        31 => "Unused axis words with G80 active",
        32 => "Arc has no axis words in the selected plane",
        33 => "Invalid motion target",
        34 => "Arc radius definition error",
        35 => "Arc offset definition missing IJK word",
        36 => "Unused words in block",
        37 => "Tool length offset not on configured axis",
        38 => "Tool number exceeds maximum",
        _ => "Unknown error code",
    }
}

/// Human-readable meaning of an `ALARM:N` message
pub fn describe_alarm(code: u8) -> &'static str {
    match code {
        1 => "Hard limit triggered, position lost",
        2 => "Motion target exceeds machine travel",
        3 => "Reset while in motion, position lost",
        4 => "Probe not in expected initial state",
        5 => "Probe did not contact the workpiece",
        6 => "Homing reset during cycle",
        7 => "Safety door opened during homing",
        8 => "Homing failed to clear limit switch",
        9 => "Homing could not find limit switch",
        _ => "Unknown alarm code",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(describe_error(22), "Feed rate not set");
        assert_eq!(describe_alarm(2), "Motion target exceeds machine travel");
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(describe_error(200), "Unknown error code");
        assert_eq!(describe_alarm(0), "Unknown alarm code");
    }
}
