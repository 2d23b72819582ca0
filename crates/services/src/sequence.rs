use std::sync::Arc;

use bson::oid::ObjectId;
use campus_db::models::{SequenceEvent, User};
use mongodb::Database;
use tracing::{info, warn};

use crate::dao::base::DaoResult;
use crate::dao::sequence::SequenceDao;
use crate::mail::MailJob;
use crate::queue_client::JobQueueClient;

/// Enrolls users into mail sequences when a trigger event fires.
pub struct SequenceService {
    dao: SequenceDao,
    queue: Arc<JobQueueClient>,
}

impl SequenceService {
    pub fn new(db: &Database, queue: Arc<JobQueueClient>) -> Self {
        Self {
            dao: SequenceDao::new(db),
            queue,
        }
    }

    /// Adds `user` to every active sequence bound to `event` and sends the
    /// first published mail to new entrants. Returns how many sequences the
    /// user entered. A user never re-enters a sequence, so repeated events
    /// send nothing new.
    pub async fn trigger(
        &self,
        domain: ObjectId,
        event: SequenceEvent,
        entity_id: &str,
        user: &User,
    ) -> DaoResult<usize> {
        let Some(user_id) = user.id else {
            return Ok(0);
        };

        let mut entered = 0;
        for sequence in self.dao.find_triggered(domain, event, entity_id).await? {
            let Some(sequence_id) = sequence.id else {
                continue;
            };
            if !self.dao.add_entrant(sequence_id, user_id).await? {
                continue;
            }
            entered += 1;
            info!(%sequence_id, %user_id, ?event, "User entered sequence");

            if let Some(email) = sequence.first_published_email() {
                let job = MailJob {
                    to: vec![user.email.clone()],
                    from: None,
                    subject: email.subject.clone(),
                    body: email.content.clone(),
                };
                // Mail trouble must not undo the enrollment.
                if let Err(e) = self.queue.send_mail(job).await {
                    warn!(%sequence_id, %user_id, error = %e, "Sequence mail not delivered");
                }
            }
        }

        Ok(entered)
    }
}
