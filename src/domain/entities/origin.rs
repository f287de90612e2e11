//! Load provenance and cloud policy.

/// Where a load request came from. Sources never interpret this; it is
/// handed to the loader so it can refresh stale references on retry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FileOrigin {
    /// No provenance known.
    #[default]
    Unknown,
    /// The image is attached to a message.
    Message {
        /// Chat the message belongs to.
        chat_id: i64,
        /// Message identifier within the chat.
        message_id: i64,
    },
    /// The image is a profile photo.
    Profile {
        /// Owner of the photo.
        peer_id: i64,
    },
    /// The image was discovered at a web address.
    Url(String),
}

impl std::fmt::Display for FileOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Message {
                chat_id,
                message_id,
            } => write!(f, "message:{chat_id}/{message_id}"),
            Self::Profile { peer_id } => write!(f, "profile:{peer_id}"),
            Self::Url(url) => write!(f, "url:{url}"),
        }
    }
}

/// Whether a loader may go to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadFromCloud {
    /// Local cache first, then the network.
    #[default]
    CloudOrLocal,
    /// Local cache only, e.g. on metered connections.
    LocalOnly,
}

impl LoadFromCloud {
    /// Returns true if the network may be used.
    #[must_use]
    pub const fn allows_cloud(self) -> bool {
        matches!(self, Self::CloudOrLocal)
    }
}
