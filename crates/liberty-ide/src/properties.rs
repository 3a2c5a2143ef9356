//! Completion and hover for `bootstrap.properties` and `server.env`.
//!
//! Property support is table-driven: enumerated value sets for the keys the
//! runtime documents, key descriptions for hover, and the equivalence
//! mapping between bootstrap keys and their environment-variable
//! counterparts (equivalent keys share values and descriptions).

use std::path::Path;

use liberty_core::{CompletionItem, HoverContent, LineIndex, TextEdit, TextSize};
use liberty_properties::{PropertiesDialect, PropertiesFile, PropertySpan};

/// Which property file a document is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyFileKind {
    Bootstrap,
    ServerEnv,
}

impl PropertyFileKind {
    fn dialect(self) -> PropertiesDialect {
        match self {
            PropertyFileKind::Bootstrap => PropertiesDialect::Bootstrap,
            PropertyFileKind::ServerEnv => PropertiesDialect::ServerEnv,
        }
    }
}

/// Classify a document path by file name.
pub fn property_file_kind(path: &Path) -> Option<PropertyFileKind> {
    match path.file_name()?.to_str()? {
        "bootstrap.properties" => Some(PropertyFileKind::Bootstrap),
        "server.env" => Some(PropertyFileKind::ServerEnv),
        _ => None,
    }
}

const BOOLEAN_VALUES: &[&str] = &["true", "false"];
const YES_NO_VALUES: &[&str] = &["y", "n"];
const LOGGING_SOURCE_VALUES: &[&str] = &["message", "trace", "accessLog", "ffdc", "audit"];
const CONSOLE_FORMAT_VALUES: &[&str] = &["dev", "simple", "json"];
const CONSOLE_LOGLEVEL_VALUES: &[&str] = &["INFO", "AUDIT", "WARNING", "ERROR", "OFF"];
const MESSAGE_FORMAT_VALUES: &[&str] = &["simple", "json"];

/// `server.env` variables with enumerated values.
const ENV_VALUES: &[(&str, &[&str])] = &[
    ("WLP_DEBUG_SUSPEND", YES_NO_VALUES),
    ("WLP_DEBUG_REMOTE", YES_NO_VALUES),
    ("WLP_LOGGING_CONSOLE_FORMAT", CONSOLE_FORMAT_VALUES),
    ("WLP_LOGGING_CONSOLE_LOGLEVEL", CONSOLE_LOGLEVEL_VALUES),
    ("WLP_LOGGING_CONSOLE_SOURCE", LOGGING_SOURCE_VALUES),
    ("WLP_LOGGING_MESSAGE_FORMAT", MESSAGE_FORMAT_VALUES),
    ("WLP_LOGGING_MESSAGE_SOURCE", LOGGING_SOURCE_VALUES),
];

/// `bootstrap.properties` keys with enumerated values.
const BOOTSTRAP_VALUES: &[(&str, &[&str])] = &[
    ("com.ibm.ws.logging.copy.system.streams", BOOLEAN_VALUES),
    ("com.ibm.ws.logging.newLogsOnStart", BOOLEAN_VALUES),
    ("com.ibm.ws.logging.isoDateFormat", BOOLEAN_VALUES),
    ("com.ibm.ws.logging.trace.format", &["ENHANCED", "BASIC", "ADVANCED"]),
    ("websphere.log.provider", &["binaryLogging-1.0"]),
    ("com.ibm.hpel.log.bufferingEnabled", BOOLEAN_VALUES),
];

/// Bootstrap key ↔ server.env variable equivalences.
const EQUIVALENTS: &[(&str, &str)] = &[
    ("com.ibm.ws.logging.console.format", "WLP_LOGGING_CONSOLE_FORMAT"),
    ("com.ibm.ws.logging.console.log.level", "WLP_LOGGING_CONSOLE_LOGLEVEL"),
    ("com.ibm.ws.logging.console.source", "WLP_LOGGING_CONSOLE_SOURCE"),
    ("com.ibm.ws.logging.message.format", "WLP_LOGGING_MESSAGE_FORMAT"),
    ("com.ibm.ws.logging.message.source", "WLP_LOGGING_MESSAGE_SOURCE"),
];

const DESCRIPTIONS: &[(&str, &str)] = &[
    (
        "wlp.install.dir",
        "The directory where the Open Liberty runtime is installed.",
    ),
    (
        "com.ibm.ws.logging.message.format",
        "This setting specifies the required format for the messages.log file. Valid values are `simple` or `json` format. By default, messageFormat is set to `simple`.",
    ),
    (
        "com.ibm.ws.logging.console.format",
        "This setting specifies the required format for the console. Valid values are `dev`, `simple`, or `json` format. By default, consoleFormat is set to `dev`.",
    ),
    (
        "com.ibm.ws.logging.console.log.level",
        "This filter controls the granularity of messages that go to the console. The valid values are `INFO`, `AUDIT`, `WARNING`, `ERROR`, and `OFF`. The default is `AUDIT`.",
    ),
    (
        "com.ibm.ws.logging.console.source",
        "This setting specifies a comma-separated list of sources that route to the console.",
    ),
    (
        "com.ibm.ws.logging.message.source",
        "This setting specifies a comma-separated list of sources that route to the messages.log file.",
    ),
    (
        "com.ibm.ws.logging.trace.format",
        "This setting controls the format of the trace log.",
    ),
    (
        "com.ibm.ws.logging.newLogsOnStart",
        "If this setting is set to true when the server starts, any existing messages.log or trace.log files are rolled over.",
    ),
    (
        "com.ibm.ws.logging.copy.system.streams",
        "If this setting is set to true, messages written to the System.out and System.err streams are copied to process stdout and stderr.",
    ),
    (
        "com.ibm.ws.logging.isoDateFormat",
        "This setting specifies whether to use ISO-8601 formatted dates in log files.",
    ),
    (
        "com.ibm.hpel.log.bufferingEnabled",
        "This setting specifies whether to allow a small delay in saving records to the disk for improved performance.",
    ),
    (
        "websphere.log.provider",
        "This setting configures binary logging for the server.",
    ),
    (
        "WLP_DEBUG_SUSPEND",
        "Whether to suspend the JVM on startup until a debugger attaches. Valid values are `y` and `n`.",
    ),
    (
        "WLP_DEBUG_REMOTE",
        "Whether to allow remote debugging of the server. Valid values are `y` and `n`.",
    ),
    (
        "WLP_USER_DIR",
        "The directory where the server configuration (usr content) is located.",
    ),
    (
        "WLP_OUTPUT_DIR",
        "The directory where the server writes generated output files.",
    ),
];

/// Enumerated valid values for a key in a given file kind, if any.
pub fn valid_values(kind: PropertyFileKind, key: &str) -> Option<&'static [&'static str]> {
    match kind {
        PropertyFileKind::ServerEnv => lookup(ENV_VALUES, key),
        PropertyFileKind::Bootstrap => lookup(BOOTSTRAP_VALUES, key).or_else(|| {
            // Bootstrap keys with a server.env equivalent share its values.
            let env_key = EQUIVALENTS
                .iter()
                .find(|(bootstrap, _)| *bootstrap == key)
                .map(|(_, env)| *env)?;
            lookup(ENV_VALUES, env_key)
        }),
    }
}

/// Hover description for a key, shared across equivalent keys.
pub fn key_description(key: &str) -> Option<&'static str> {
    if let Some(description) = lookup(DESCRIPTIONS, key) {
        return Some(description);
    }

    // An env var documents itself through its bootstrap equivalent and vice
    // versa.
    let equivalent = EQUIVALENTS.iter().find_map(|(bootstrap, env)| {
        if *bootstrap == key {
            Some(*env)
        } else if *env == key {
            Some(*bootstrap)
        } else {
            None
        }
    })?;
    lookup(DESCRIPTIONS, equivalent)
}

fn lookup<T: Copy>(table: &'static [(&'static str, T)], key: &str) -> Option<T> {
    table.iter().find(|(name, _)| *name == key).map(|(_, v)| *v)
}

/// Value completions at `offset`, replacing the current value span.
pub fn property_completions(
    text: &str,
    kind: PropertyFileKind,
    offset: TextSize,
) -> Vec<CompletionItem> {
    let file = PropertiesFile::parse(text, kind.dialect());
    let Some((entry, PropertySpan::Value)) = file.entry_at(offset) else {
        return Vec::new();
    };
    let Some(values) = valid_values(kind, &entry.key) else {
        return Vec::new();
    };

    let index = LineIndex::new(text);
    let edit_range = index.range(text, entry.value_range);

    values
        .iter()
        .map(|value| CompletionItem {
            label: (*value).to_string(),
            detail: None,
            documentation: None,
            text_edit: Some(TextEdit::new(edit_range, *value)),
        })
        .collect()
}

/// Key hover at `offset`.
pub fn property_hover(text: &str, kind: PropertyFileKind, offset: TextSize) -> Option<HoverContent> {
    let file = PropertiesFile::parse(text, kind.dialect());
    let (entry, span) = file.entry_at(offset)?;
    if span != PropertySpan::Key {
        return None;
    }

    let description = key_description(&entry.key)?;
    let index = LineIndex::new(text);
    Some(HoverContent {
        value: description.to_string(),
        range: Some(index.range(text, entry.key_range)),
    })
}
