//! Closed keyword sets used by extraction results.

use std::fmt;

macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "String", into = "&'static str")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Canonical wire spelling.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            /// Case-insensitive parse accepting a few spelling variants.
            pub fn parse(raw: &str) -> Option<Self> {
                let lowered = raw.trim().to_lowercase();
                match lowered.as_str() {
                    $($text $(| $alias)* => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl From<$name> for &'static str {
            fn from(value: $name) -> Self {
                value.as_str()
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(raw: String) -> Result<Self, Self::Error> {
                Self::parse(&raw).ok_or_else(|| format!("unknown {}: {}", stringify!($name), raw))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

keyword_enum! {
    /// Task urgency as the model names it.
    Priority {
        Low => "low",
        Medium => "medium" | "normal",
        High => "high",
        Urgent => "urgent" | "critical",
    }
}

impl Priority {
    /// Store priority level, 1 (lowest) to 4 (highest).
    pub fn store_level(&self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Urgent => 4,
        }
    }

    pub fn from_store_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Priority::Low),
            2 => Some(Priority::Medium),
            3 => Some(Priority::High),
            4 => Some(Priority::Urgent),
            _ => None,
        }
    }
}

keyword_enum! {
    /// Who owes the work: the user (`from_me`) or someone else to the user (`to_me`).
    Direction {
        FromMe => "from_me" | "from me" | "from-me",
        ToMe => "to_me" | "to me" | "to-me",
    }
}

keyword_enum! {
    /// Requested workflow status for an existing task.
    TaskStatus {
        Todo => "todo" | "to do" | "open",
        InProgress => "in_progress" | "in progress" | "in-progress",
        Blocked => "blocked",
        Done => "done" | "completed" | "closed",
    }
}

keyword_enum! {
    /// Reminder repetition.
    RepeatRule {
        Once => "none" | "once",
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
    }
}
