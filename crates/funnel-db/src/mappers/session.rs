//! Session row -> record mapper

use funnel_core::{SessionRecord, UserId};

use crate::models::SessionModel;

impl From<SessionModel> for SessionRecord {
    fn from(model: SessionModel) -> Self {
        SessionRecord {
            user_id: UserId::new(model.user_id),
            step: model.step,
            payload: model.payload,
            updated_at: model.updated_at,
        }
    }
}
