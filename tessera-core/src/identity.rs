use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::Booking;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Organizer,
    Admin,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "ORGANIZER" => Ok(Role::Organizer),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// The caller identity resolved by the hosting layer. The booking service
/// trusts this value verbatim.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

/// Only the booking's owner or an admin may cancel it.
pub fn can_cancel_booking(actor: &Actor, booking: &Booking) -> bool {
    actor.role == Role::Admin || actor.id == booking.user_id
}

pub fn can_create_events(actor: &Actor) -> bool {
    matches!(actor.role, Role::Organizer | Role::Admin)
}

/// Approval, decline and price changes are admin-only.
pub fn can_manage_events(actor: &Actor) -> bool {
    actor.role == Role::Admin
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use chrono::Utc;

    fn booking_owned_by(user_id: Uuid) -> Booking {
        let event = Event::new(
            Uuid::new_v4(),
            "Jazz Evening".to_string(),
            None,
            "Blue Note".to_string(),
            Utc::now(),
            1500,
            "USD".to_string(),
            20,
        );
        Booking::new(user_id, &event, 2)
    }

    #[test]
    fn test_owner_and_admin_can_cancel() {
        let owner = Actor { id: Uuid::new_v4(), role: Role::User };
        let admin = Actor { id: Uuid::new_v4(), role: Role::Admin };
        let stranger = Actor { id: Uuid::new_v4(), role: Role::User };
        let organizer = Actor { id: Uuid::new_v4(), role: Role::Organizer };
        let booking = booking_owned_by(owner.id);

        assert!(can_cancel_booking(&owner, &booking));
        assert!(can_cancel_booking(&admin, &booking));
        assert!(!can_cancel_booking(&stranger, &booking));
        assert!(!can_cancel_booking(&organizer, &booking));
    }

    #[test]
    fn test_event_capabilities_by_role() {
        let user = Actor { id: Uuid::new_v4(), role: Role::User };
        let organizer = Actor { id: Uuid::new_v4(), role: Role::Organizer };
        let admin = Actor { id: Uuid::new_v4(), role: Role::Admin };

        assert!(!can_create_events(&user));
        assert!(can_create_events(&organizer));
        assert!(can_create_events(&admin));

        assert!(!can_manage_events(&user));
        assert!(!can_manage_events(&organizer));
        assert!(can_manage_events(&admin));
    }
}
