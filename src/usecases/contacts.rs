use crate::common::context::Context;
use crate::common::error::{ServiceResult, store_unavailable};
use crate::models::contacts::{Contact, ConversationActivity};
use crate::models::conversations::Conversation;
use crate::models::messages::Message;
use crate::models::users::Profile;
use crate::entities::messages::Message as MessageEntity;
use crate::repositories::messages;
use crate::usecases::{conversations, users};
use hashbrown::HashMap;
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

/// The viewer's contact list: one entry per counterpart, most recent activity first.
pub async fn fetch_contacts<C: Context>(ctx: &C, viewer_id: i64) -> ServiceResult<Vec<Contact>> {
    let conversations = conversations::fetch_all(ctx, viewer_id).await?;
    if conversations.is_empty() {
        return Ok(vec![]);
    }

    let unread_counts = match messages::fetch_unread_counts(ctx, viewer_id).await {
        Ok(counts) => counts
            .into_iter()
            .filter_map(|count| {
                let conversation_id = Uuid::from_str(&count.conversation_id).ok()?;
                Some((conversation_id, count.unread_count))
            })
            .collect::<HashMap<_, _>>(),
        Err(e) => return store_unavailable(e),
    };
    let mut latest = match messages::fetch_latest_for_user(ctx, viewer_id).await {
        Ok(latest) => latest_by_conversation(latest),
        Err(e) => return store_unavailable(e),
    };

    let activity: Vec<ConversationActivity> = conversations
        .into_iter()
        .map(|conversation| ConversationActivity {
            unread_count: unread_counts
                .get(&conversation.conversation_id)
                .copied()
                .unwrap_or(0),
            last_message: latest.remove(&conversation.conversation_id),
            conversation,
        })
        .collect();

    let counterpart_ids: Vec<i64> = activity
        .iter()
        .filter_map(|entry| entry.conversation.counterpart_of(viewer_id))
        .collect();
    let profiles = users::fetch_profiles(ctx, &counterpart_ids).await?;
    Ok(aggregate(viewer_id, activity, &profiles))
}

fn latest_by_conversation(rows: Vec<MessageEntity>) -> HashMap<Uuid, Message> {
    let mut latest = HashMap::with_capacity(rows.len());
    for row in rows {
        let message_id = row.id;
        match Message::try_from(row) {
            Ok(message) => {
                latest.insert(message.conversation_id, message);
            }
            Err(e) => warn!(message_id, code = e.code(), "Skipping unreadable latest message"),
        }
    }
    latest
}

/// Folds per-conversation activity into one entry per counterpart.
///
/// Counterparts without a profile are skipped. If more than one conversation exists
/// with the same counterpart, unread counts add up and the most recent one wins.
pub fn aggregate(
    viewer_id: i64,
    activity: Vec<ConversationActivity>,
    profiles: &HashMap<i64, Profile>,
) -> Vec<Contact> {
    let mut contacts: HashMap<i64, Contact> = HashMap::with_capacity(activity.len());
    for entry in activity {
        let Some(counterpart_id) = entry.conversation.counterpart_of(viewer_id) else {
            continue;
        };
        let Some(profile) = profiles.get(&counterpart_id) else {
            warn!(
                counterpart_id,
                conversation_id = entry.conversation.conversation_id.to_string(),
                "Missing profile for contact"
            );
            continue;
        };

        let last_activity_at = last_activity(&entry.conversation, entry.last_message.as_ref());
        match contacts.get_mut(&counterpart_id) {
            Some(contact) => {
                contact.unread_count += entry.unread_count;
                if last_activity_at > contact.last_activity_at {
                    contact.conversation_id = entry.conversation.conversation_id;
                    contact.last_message = entry.last_message;
                    contact.last_activity_at = last_activity_at;
                }
            }
            None => {
                contacts.insert(
                    counterpart_id,
                    Contact {
                        user_id: counterpart_id,
                        display_name: profile.display_name.clone(),
                        avatar_url: profile.avatar_url.clone(),
                        role: profile.role,
                        conversation_id: entry.conversation.conversation_id,
                        unread_count: entry.unread_count,
                        last_message: entry.last_message,
                        last_activity_at,
                    },
                );
            }
        }
    }

    let mut contacts: Vec<Contact> = contacts.into_values().collect();
    contacts.sort_by(|a, b| {
        b.last_activity_at
            .cmp(&a.last_activity_at)
            .then(a.user_id.cmp(&b.user_id))
    });
    contacts
}

fn last_activity(
    conversation: &Conversation,
    last_message: Option<&Message>,
) -> chrono::DateTime<chrono::Utc> {
    match last_message {
        Some(message) => message.created_at.max(conversation.last_activity_at()),
        None => conversation.last_activity_at(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::testing::{
        self, MENTOR_ID, OTHER_MENTOR_ID, OTHER_STUDENT_ID, STUDENT_ID, sample_message,
    };
    use crate::common::to_datetime;
    use crate::models::conversations::{Engagement, PaymentStatus};
    use crate::models::messages::SendMessageArgs;
    use crate::models::users::Role;
    use crate::usecases::messages as message_usecases;

    fn conversation(student_id: i64, mentor_id: i64, created_at: i64) -> Conversation {
        Conversation {
            conversation_id: Uuid::new_v4(),
            student_id,
            mentor_id,
            payment_status: PaymentStatus::Completed,
            created_at: to_datetime(created_at),
            updated_at: to_datetime(created_at),
            last_message_at: None,
        }
    }

    fn profile(user_id: i64, role: Role) -> Profile {
        Profile {
            user_id,
            display_name: format!("user {user_id}"),
            avatar_url: None,
            role,
        }
    }

    fn text(content: &str) -> SendMessageArgs<'_> {
        SendMessageArgs {
            content,
            is_preset: false,
            attachment_url: None,
        }
    }

    #[test]
    fn contacts_are_sorted_by_latest_activity() {
        let profiles = HashMap::from([
            (MENTOR_ID, profile(MENTOR_ID, Role::Mentor)),
            (OTHER_MENTOR_ID, profile(OTHER_MENTOR_ID, Role::Mentor)),
        ]);
        let quiet = conversation(STUDENT_ID, MENTOR_ID, 1_000);
        let mut busy = conversation(STUDENT_ID, OTHER_MENTOR_ID, 500);
        let mut message = sample_message(9, 5_000);
        message.conversation_id = busy.conversation_id;
        busy.last_message_at = Some(message.created_at);

        let contacts = aggregate(
            STUDENT_ID,
            vec![
                ConversationActivity {
                    conversation: quiet,
                    unread_count: 0,
                    last_message: None,
                },
                ConversationActivity {
                    conversation: busy,
                    unread_count: 1,
                    last_message: Some(message.clone()),
                },
            ],
            &profiles,
        );

        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].user_id, OTHER_MENTOR_ID);
        assert_eq!(contacts[0].unread_count, 1);
        assert_eq!(contacts[0].last_message, Some(message));
        assert_eq!(contacts[1].user_id, MENTOR_ID);
        assert_eq!(contacts[1].last_activity_at, to_datetime(1_000));
    }

    #[test]
    fn duplicate_conversations_collapse_into_one_contact() {
        let profiles = HashMap::from([(MENTOR_ID, profile(MENTOR_ID, Role::Mentor))]);
        let older = conversation(STUDENT_ID, MENTOR_ID, 1_000);
        let newer = conversation(STUDENT_ID, MENTOR_ID, 2_000);
        let newer_id = newer.conversation_id;

        let contacts = aggregate(
            STUDENT_ID,
            vec![
                ConversationActivity {
                    conversation: older,
                    unread_count: 2,
                    last_message: None,
                },
                ConversationActivity {
                    conversation: newer,
                    unread_count: 3,
                    last_message: None,
                },
            ],
            &profiles,
        );

        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].unread_count, 5);
        assert_eq!(contacts[0].conversation_id, newer_id);
    }

    #[test]
    fn unreadable_latest_messages_are_skipped() {
        let conversation_id = Uuid::new_v4();
        let row = |id: i64, conversation_id: String| MessageEntity {
            id,
            conversation_id,
            sender_id: MENTOR_ID,
            content: "hello".to_owned(),
            is_preset: false,
            attachment_url: None,
            created_at: 1_000,
            read_at: None,
        };

        let latest = latest_by_conversation(vec![
            row(1, "not-a-uuid".to_owned()),
            row(2, conversation_id.to_string()),
        ]);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[&conversation_id].message_id, 2);
    }

    #[test]
    fn counterparts_without_profiles_are_skipped() {
        let contacts = aggregate(
            STUDENT_ID,
            vec![ConversationActivity {
                conversation: conversation(STUDENT_ID, MENTOR_ID, 1_000),
                unread_count: 0,
                last_message: None,
            }],
            &HashMap::new(),
        );
        assert!(contacts.is_empty());
    }

    #[tokio::test]
    async fn unread_counts_follow_reads() {
        let ctx = testing::state().await;
        let id = conversations::start(&ctx, &testing::mentor(), STUDENT_ID, Engagement::Free)
            .await
            .unwrap()
            .conversation_id;
        for content in ["one", "two", "three"] {
            message_usecases::send(&ctx, &testing::mentor(), id, text(content))
                .await
                .unwrap();
        }
        message_usecases::send(&ctx, &testing::student(), id, text("hello"))
            .await
            .unwrap();

        let contacts = fetch_contacts(&ctx, STUDENT_ID).await.unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].user_id, MENTOR_ID);
        assert_eq!(contacts[0].display_name, "Morgan Mentor");
        assert_eq!(contacts[0].unread_count, 3);
        assert_eq!(
            contacts[0].last_message.as_ref().map(|m| m.content.as_str()),
            Some("hello")
        );

        let mentor_view = fetch_contacts(&ctx, MENTOR_ID).await.unwrap();
        assert_eq!(mentor_view[0].user_id, STUDENT_ID);
        assert_eq!(mentor_view[0].unread_count, 1);

        message_usecases::mark_all_read(&ctx, &testing::student(), id)
            .await
            .unwrap();
        let contacts = fetch_contacts(&ctx, STUDENT_ID).await.unwrap();
        assert_eq!(contacts[0].unread_count, 0);
    }

    #[tokio::test]
    async fn contacts_are_scoped_to_the_viewer() {
        let ctx = testing::state().await;
        conversations::start(&ctx, &testing::student(), MENTOR_ID, Engagement::Paid)
            .await
            .unwrap();

        assert!(fetch_contacts(&ctx, OTHER_STUDENT_ID).await.unwrap().is_empty());
        assert!(fetch_contacts(&ctx, OTHER_MENTOR_ID).await.unwrap().is_empty());
    }
}
