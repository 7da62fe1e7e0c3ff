pub mod directive;
pub mod stream;

pub use directive::LANGUAGE_DIRECTIVE_PREFIX;
pub use stream::{DataMessage, DataMessageError, RoomEvent, TranscriptionSegment};

macro_rules! common_derives {
    ($item:item) => {
        #[derive(
            Debug,
            Eq,
            PartialEq,
            Clone,
            serde::Serialize,
            serde::Deserialize,
            specta::Type,
        )]
        $item
    };
}

pub(crate) use common_derives;
