// ── Fired commands ──
//
// Tasker's command system lets any profile push a free-form string onto
// the device's command bus. The conventional shape is
// `prefix=:=param1=:=param2`; consumers route on the prefix.

/// Separator between the segments of a fired command string.
pub const COMMAND_SEPARATOR: &str = "=:=";

/// A command drained from the remote command log, split for routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredCommand {
    /// The untouched command string.
    pub raw: String,
    /// Everything before the first separator.
    pub prefix: String,
    /// Remaining segments, possibly empty.
    pub params: Vec<String>,
}

impl FiredCommand {
    /// Split a raw command string. Never fails: a string without the
    /// separator is a prefix with no params.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let mut parts = raw.split(COMMAND_SEPARATOR);
        let prefix = parts.next().unwrap_or_default().to_owned();
        let params = parts.map(str::to_owned).collect();
        Self { raw, prefix, params }
    }
}

impl From<&str> for FiredCommand {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::FiredCommand;

    #[test]
    fn parse_with_params() {
        let cmd = FiredCommand::parse("lights=:=on=:=living_room");
        assert_eq!(cmd.prefix, "lights");
        assert_eq!(cmd.params, vec!["on", "living_room"]);
        assert_eq!(cmd.raw, "lights=:=on=:=living_room");
    }

    #[test]
    fn parse_bare_prefix() {
        let cmd = FiredCommand::parse("doorbell");
        assert_eq!(cmd.prefix, "doorbell");
        assert!(cmd.params.is_empty());
    }

    #[test]
    fn parse_preserves_empty_segments() {
        let cmd = FiredCommand::parse("a=:==:=c");
        assert_eq!(cmd.params, vec!["", "c"]);
    }
}
