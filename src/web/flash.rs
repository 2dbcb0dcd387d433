use tower_sessions::Session;

use crate::error::StudioError;

const FLASH_FLAG_KEY: &str = "flash_flag";

pub(crate) const FLASH_TEMPLATE_LOADED: u16 = 1;
pub(crate) const FLASH_HISTORY_CLEARED: u16 = 2;
pub(crate) const FLASH_NOTHING_TO_REMIX: u16 = 3;
pub(crate) const FLASH_SURPRISE: u16 = 4;

#[derive(Clone, Debug)]
pub(crate) struct FlashMessage {
    pub(crate) text: &'static str,
    pub(crate) class: &'static str,
}

pub(crate) async fn set_flash(session: &Session, flag: u16) -> Result<(), StudioError> {
    session.insert(FLASH_FLAG_KEY, flag).await?;
    Ok(())
}

pub(crate) async fn take_flash_message(
    session: &Session,
) -> Result<Option<FlashMessage>, StudioError> {
    let flag = session
        .get::<u16>(FLASH_FLAG_KEY)
        .await?
        .filter(|flag| *flag != 0);
    if flag.is_some() {
        session.insert(FLASH_FLAG_KEY, 0u16).await?;
    }
    Ok(flag.and_then(message_for))
}

/// Flash fields in the shape the page templates expect.
pub(crate) async fn take_flash_fields(
    session: &Session,
) -> Result<(bool, String, String), StudioError> {
    Ok(match take_flash_message(session).await? {
        Some(message) => (true, message.text.to_string(), message.class.to_string()),
        None => (false, String::new(), String::new()),
    })
}

fn message_for(flag: u16) -> Option<FlashMessage> {
    match flag {
        FLASH_TEMPLATE_LOADED => Some(FlashMessage {
            text: "Template loaded. Tweak the prompt or hit generate.",
            class: "success",
        }),
        FLASH_HISTORY_CLEARED => Some(FlashMessage {
            text: "History cleared.",
            class: "success",
        }),
        FLASH_NOTHING_TO_REMIX => Some(FlashMessage {
            text: "Create a design first, then remix it.",
            class: "warning",
        }),
        FLASH_SURPRISE => Some(FlashMessage {
            text: "Surprise! A random template has been loaded.",
            class: "success",
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    #[tokio::test]
    async fn flash_is_shown_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        set_flash(&session, FLASH_HISTORY_CLEARED)
            .await
            .expect("set flash");
        let message = take_flash_message(&session)
            .await
            .expect("take flash")
            .expect("message present");
        assert_eq!(message.text, "History cleared.");
        assert!(
            take_flash_message(&session)
                .await
                .expect("take flash")
                .is_none()
        );
    }
}
