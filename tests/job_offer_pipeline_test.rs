use std::sync::Arc;

use rust_decimal::Decimal;
use staffing_backend::{
    error::{Entity, Error},
    models::customer::NewCustomer,
    models::event::{EntityType, LifecycleEvent},
    models::job_offer::{JobOffer, JobStatus, NewJobOffer},
    models::professional::{max_daily_rate, EmploymentState, NewProfessional, Professional},
    services::job_offer_service::StatusChange,
    services::notification_service::NotificationService,
    store::InMemoryStore,
    AppState,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_test::{assert_err, assert_ok};

struct Harness {
    state: AppState,
    events: UnboundedReceiver<LifecycleEvent>,
    customer_id: i64,
}

async fn harness() -> Harness {
    let (notifications, events) = NotificationService::channel();
    let state = AppState::new(Arc::new(InMemoryStore::new()), notifications);
    let customer = state
        .customer_service
        .create(NewCustomer {
            name: "Acme".into(),
            note: None,
        })
        .await
        .unwrap();
    Harness {
        state,
        events,
        customer_id: customer.id,
    }
}

impl Harness {
    async fn professional(&self, daily_rate: i64) -> Professional {
        self.register(Decimal::from(daily_rate)).await.unwrap()
    }

    async fn register(&self, daily_rate: Decimal) -> staffing_backend::error::Result<Professional> {
        self.state
            .professional_service
            .create(NewProfessional {
                name: "Ada".into(),
                skills: vec!["rust".into()],
                geographical_location: "Milan".into(),
                daily_rate,
            })
            .await
    }

    async fn offer(&self, duration: i32) -> JobOffer {
        self.state
            .job_offer_service
            .create(NewJobOffer {
                customer_id: self.customer_id,
                required_skills: vec!["rust".into()],
                duration,
                note: None,
            })
            .await
            .unwrap()
    }

    async fn change(
        &self,
        id: i64,
        next_status: JobStatus,
        ids: &[i64],
    ) -> staffing_backend::error::Result<JobOffer> {
        self.state
            .job_offer_service
            .change_status(id, change(next_status, ids))
            .await
    }

    /// Drives an offer to CANDIDATE_PROPOSAL with the given candidates.
    async fn proposed(&self, duration: i32, ids: &[i64]) -> JobOffer {
        let offer = self.offer(duration).await;
        self.change(offer.id, JobStatus::SelectionPhase, ids)
            .await
            .unwrap();
        self.change(offer.id, JobStatus::CandidateProposal, ids)
            .await
            .unwrap()
    }

    async fn employment_state(&self, id: i64) -> EmploymentState {
        self.state
            .professional_service
            .get(id)
            .await
            .unwrap()
            .employment_state
    }

    fn drain_events(&mut self) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

fn change(next_status: JobStatus, ids: &[i64]) -> StatusChange {
    StatusChange {
        next_status,
        candidate_professional_ids: ids.to_vec(),
        note: None,
    }
}

#[tokio::test]
async fn new_offer_starts_created_and_requires_candidates_for_selection() {
    let h = harness().await;
    let offer = h.offer(3).await;
    assert_eq!(offer.status, JobStatus::Created);
    assert_eq!(offer.value, Decimal::ZERO);

    let err = h
        .change(offer.id, JobStatus::SelectionPhase, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RequiredProfessionalId(_)));

    let err = h
        .change(offer.id, JobStatus::SelectionPhase, &[-4])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RequiredProfessionalId(_)));

    let unchanged = h.state.job_offer_service.get(offer.id).await.unwrap();
    assert_eq!(unchanged.status, JobStatus::Created);
    assert_eq!(unchanged.version, offer.version);
}

#[tokio::test]
async fn full_pipeline_consolidates_and_computes_value() {
    let h = harness().await;
    let professional = h.professional(100).await;
    let offer = h.offer(3).await;

    let selected = h
        .change(offer.id, JobStatus::SelectionPhase, &[professional.id])
        .await
        .unwrap();
    assert_eq!(selected.status, JobStatus::SelectionPhase);
    assert_eq!(
        h.employment_state(professional.id).await,
        EmploymentState::AvailableForWork
    );

    let proposed = h
        .change(offer.id, JobStatus::CandidateProposal, &[professional.id])
        .await
        .unwrap();
    assert_eq!(proposed.value, Decimal::ZERO);
    assert_eq!(proposed.candidates.len(), 1);

    let consolidated = h
        .change(offer.id, JobStatus::Consolidated, &[professional.id])
        .await
        .unwrap();
    assert_eq!(consolidated.status, JobStatus::Consolidated);
    assert_eq!(consolidated.professional_id, Some(professional.id));
    assert_eq!(consolidated.value, Decimal::from(300));
    assert_eq!(
        h.employment_state(professional.id).await,
        EmploymentState::Employed
    );
}

#[tokio::test]
async fn concurrent_consolidations_never_double_book() {
    let h = harness().await;
    let professional = h.professional(100).await;
    let first = h.proposed(3, &[professional.id]).await;
    let second = h.proposed(5, &[professional.id]).await;

    let ids = [professional.id];
    let (a, b) = tokio::join!(
        h.change(first.id, JobStatus::Consolidated, &ids),
        h.change(second.id, JobStatus::Consolidated, &ids),
    );

    let (winner, loser) = match (a, b) {
        (Ok(offer), Err(err)) | (Err(err), Ok(offer)) => (offer, err),
        (a, b) => panic!("expected exactly one consolidation, got {:?} / {:?}", a, b),
    };
    assert!(
        matches!(
            loser,
            Error::NotAvailable { .. } | Error::InconsistentProfessionalStatus { .. }
        ),
        "unexpected error {:?}",
        loser
    );
    assert_eq!(winner.professional_id, Some(professional.id));
    assert_eq!(
        h.employment_state(professional.id).await,
        EmploymentState::Employed
    );
}

#[tokio::test]
async fn direct_reservation_racing_consolidation_is_detected() {
    let h = harness().await;
    let professional = h.professional(80).await;
    let offer = h.proposed(2, &[professional.id]).await;

    let ids = [professional.id];
    let (consolidated, reserved) = tokio::join!(
        h.change(offer.id, JobStatus::Consolidated, &ids),
        h.state.professional_service.reserve(professional.id),
    );
    assert!(
        consolidated.is_ok() ^ reserved.is_ok(),
        "exactly one reservation must win"
    );
    if let Err(err) = consolidated {
        assert!(matches!(err, Error::InconsistentProfessionalStatus { .. }));
        let offer = h.state.job_offer_service.get(offer.id).await.unwrap();
        assert_eq!(offer.status, JobStatus::CandidateProposal);
        assert_eq!(offer.professional_id, None);
    }
}

#[tokio::test]
async fn state_change_since_candidacy_fails_consolidation() {
    let h = harness().await;
    let professional = h.professional(100).await;
    let offer = h.proposed(3, &[professional.id]).await;

    h.state
        .professional_service
        .reserve(professional.id)
        .await
        .unwrap();

    let err = h
        .change(offer.id, JobStatus::Consolidated, &[professional.id])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InconsistentProfessionalStatus { professional_id } if professional_id == professional.id
    ));

    // Back to the candidacy snapshot: consolidation goes through again.
    h.state
        .professional_service
        .release(professional.id)
        .await
        .unwrap();
    let consolidated = h
        .change(offer.id, JobStatus::Consolidated, &[professional.id])
        .await
        .unwrap();
    assert_eq!(consolidated.value, Decimal::from(300));
}

#[tokio::test]
async fn unavailable_professional_cannot_enter_selection() {
    let h = harness().await;
    let professional = h.professional(100).await;
    h.state
        .professional_service
        .reserve(professional.id)
        .await
        .unwrap();
    let offer = h.offer(3).await;

    let err = h
        .change(offer.id, JobStatus::SelectionPhase, &[professional.id])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::NotAvailable {
            state: EmploymentState::Employed,
            ..
        }
    ));
}

#[tokio::test]
async fn employed_candidate_added_at_proposal_cannot_be_consolidated() {
    let h = harness().await;
    let available = h.professional(100).await;
    let busy = h.professional(120).await;
    h.state.professional_service.reserve(busy.id).await.unwrap();

    let offer = h.offer(3).await;
    h.change(offer.id, JobStatus::SelectionPhase, &[available.id])
        .await
        .unwrap();
    let proposed = h
        .change(offer.id, JobStatus::CandidateProposal, &[busy.id])
        .await
        .unwrap();
    assert_eq!(
        proposed.candidate_professional_ids().into_iter().collect::<Vec<_>>(),
        vec![available.id, busy.id]
    );

    let err = h
        .change(offer.id, JobStatus::Consolidated, &[busy.id])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotAvailable { .. }));
}

#[tokio::test]
async fn consolidation_requires_a_single_existing_candidate() {
    let h = harness().await;
    let candidate = h.professional(100).await;
    let outsider = h.professional(100).await;
    let offer = h.proposed(3, &[candidate.id]).await;

    let err = h
        .change(offer.id, JobStatus::Consolidated, &[outsider.id])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ProfessionalNotCandidate { .. }));

    let err = h
        .change(offer.id, JobStatus::Consolidated, &[candidate.id, outsider.id])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RequiredProfessionalId(_)));

    assert_eq!(
        h.employment_state(outsider.id).await,
        EmploymentState::AvailableForWork
    );
}

#[tokio::test]
async fn unknown_professional_is_not_found() {
    let h = harness().await;
    let offer = h.offer(3).await;
    let err = h
        .change(offer.id, JobStatus::SelectionPhase, &[9_999])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::NotFound {
            entity: Entity::Professional,
            id: 9_999
        }
    ));
}

#[tokio::test]
async fn unknown_job_offer_is_not_found() {
    let h = harness().await;
    let err = h
        .change(12_345, JobStatus::SelectionPhase, &[1])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::NotFound {
            entity: Entity::JobOffer,
            id: 12_345
        }
    ));
}

#[tokio::test]
async fn illegal_transition_leaves_offer_untouched() {
    let h = harness().await;
    let professional = h.professional(100).await;
    let offer = h.offer(3).await;

    let err = h
        .change(offer.id, JobStatus::Consolidated, &[professional.id])
        .await
        .unwrap_err();
    match err {
        Error::IllegalTransition { from, to, allowed } => {
            assert_eq!(from, JobStatus::Created);
            assert_eq!(to, JobStatus::Consolidated);
            assert_eq!(allowed, vec![JobStatus::SelectionPhase, JobStatus::Abort]);
        }
        other => panic!("unexpected error {:?}", other),
    }

    let err = h
        .change(offer.id, JobStatus::Created, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::IllegalTransition { .. }));

    let reloaded = h.state.job_offer_service.get(offer.id).await.unwrap();
    assert_eq!(reloaded, offer);
}

#[tokio::test]
async fn abort_is_reachable_from_every_open_status() {
    let h = harness().await;

    let created = h.offer(1).await;
    let aborted = h.change(created.id, JobStatus::Abort, &[]).await.unwrap();
    assert_eq!(aborted.status, JobStatus::Abort);
    assert!(aborted.end_time.is_some());

    let p1 = h.professional(10).await;
    let selecting = h.offer(1).await;
    h.change(selecting.id, JobStatus::SelectionPhase, &[p1.id])
        .await
        .unwrap();
    assert_eq!(
        h.change(selecting.id, JobStatus::Abort, &[])
            .await
            .unwrap()
            .status,
        JobStatus::Abort
    );

    let p2 = h.professional(10).await;
    let proposing = h.proposed(1, &[p2.id]).await;
    assert_eq!(
        h.change(proposing.id, JobStatus::Abort, &[])
            .await
            .unwrap()
            .status,
        JobStatus::Abort
    );
    assert_eq!(
        h.employment_state(p2.id).await,
        EmploymentState::AvailableForWork
    );

    let p3 = h.professional(10).await;
    let consolidated = h.proposed(1, &[p3.id]).await;
    h.change(consolidated.id, JobStatus::Consolidated, &[p3.id])
        .await
        .unwrap();
    let aborted = h
        .change(consolidated.id, JobStatus::Abort, &[])
        .await
        .unwrap();
    assert_eq!(aborted.status, JobStatus::Abort);
    assert_eq!(
        h.employment_state(p3.id).await,
        EmploymentState::AvailableForWork
    );

    let err = h
        .change(aborted.id, JobStatus::Done, &[])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::IllegalTransition { ref allowed, .. } if allowed.is_empty()
    ));
}

#[tokio::test]
async fn done_releases_professional_and_stamps_end_time() {
    let h = harness().await;
    let professional = h.professional(100).await;
    let offer = h.proposed(4, &[professional.id]).await;
    h.change(offer.id, JobStatus::Consolidated, &[professional.id])
        .await
        .unwrap();

    let done = h.change(offer.id, JobStatus::Done, &[]).await.unwrap();
    assert_eq!(done.status, JobStatus::Done);
    assert_eq!(done.value, Decimal::from(400));
    let end_time = done.end_time.expect("end time stamped");
    assert!(end_time >= done.creation_time);
    assert_eq!(
        h.employment_state(professional.id).await,
        EmploymentState::AvailableForWork
    );
}

#[tokio::test]
async fn release_is_idempotent() {
    let h = harness().await;
    let registry = &h.state.professional_service;
    let professional = h.professional(100).await;
    let reserved = assert_ok!(registry.reserve(professional.id).await);
    assert_eq!(reserved.employment_state, EmploymentState::Employed);

    let first = assert_ok!(registry.release(professional.id).await);
    let second = assert_ok!(registry.release(professional.id).await);
    assert_eq!(first.employment_state, EmploymentState::AvailableForWork);
    assert_eq!(second, first);
}

#[tokio::test]
async fn reserve_twice_reports_not_available() {
    let h = harness().await;
    let registry = &h.state.professional_service;
    let professional = h.professional(100).await;
    assert_ok!(registry.reserve(professional.id).await);
    let err = assert_err!(registry.reserve(professional.id).await);
    assert!(matches!(err, Error::NotAvailable { .. }));

    let still = assert_ok!(
        registry
            .check_still_available(professional.id, EmploymentState::AvailableForWork)
            .await
    );
    assert!(!still);
}

#[tokio::test]
async fn value_is_not_ready_before_consolidation() {
    let h = harness().await;
    let professional = h.professional(250).await;
    let offer = h.proposed(2, &[professional.id]).await;

    let err = h
        .state
        .job_offer_service
        .get_value(offer.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ValueNotReady { .. }));

    h.change(offer.id, JobStatus::Consolidated, &[professional.id])
        .await
        .unwrap();
    let valued = h
        .state
        .job_offer_service
        .get_value(offer.id)
        .await
        .unwrap();
    assert_eq!(valued.value, Decimal::from(500));
}

#[tokio::test]
async fn delete_is_allowed_only_before_consolidation() {
    let h = harness().await;
    let open = h.offer(1).await;
    h.state.job_offer_service.delete(open.id).await.unwrap();
    let err = h.state.job_offer_service.get(open.id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
    let err = h
        .change(open.id, JobStatus::SelectionPhase, &[1])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));

    let professional = h.professional(10).await;
    let offer = h.proposed(1, &[professional.id]).await;
    h.change(offer.id, JobStatus::Consolidated, &[professional.id])
        .await
        .unwrap();
    let err = h.state.job_offer_service.delete(offer.id).await.unwrap_err();
    assert!(matches!(
        err,
        Error::JobOfferNotMutable {
            status: JobStatus::Consolidated,
            ..
        }
    ));
}

#[tokio::test]
async fn offer_for_unknown_customer_is_rejected() {
    let h = harness().await;
    let err = h
        .state
        .job_offer_service
        .create(NewJobOffer {
            customer_id: 777,
            required_skills: vec!["rust".into()],
            duration: 3,
            note: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::NotFound {
            entity: Entity::Customer,
            id: 777
        }
    ));
}

#[tokio::test]
async fn every_transition_emits_one_event() {
    let mut h = harness().await;
    let professional = h.professional(100).await;
    let offer = h.proposed(3, &[professional.id]).await;
    h.change(offer.id, JobStatus::Consolidated, &[professional.id])
        .await
        .unwrap();
    let _ = h.change(offer.id, JobStatus::SelectionPhase, &[professional.id]).await;

    let events = h.drain_events();
    let transitions: Vec<_> = events
        .iter()
        .map(|e| (e.old_state.as_deref(), e.new_state.as_str()))
        .collect();
    assert_eq!(
        transitions,
        vec![
            (Some("CREATED"), "SELECTION_PHASE"),
            (Some("SELECTION_PHASE"), "CANDIDATE_PROPOSAL"),
            (Some("CANDIDATE_PROPOSAL"), "CONSOLIDATED"),
        ]
    );
    let last = events.last().unwrap();
    assert_eq!(last.entity_type, EntityType::JobOffer);
    assert_eq!(last.entity_id, offer.id);
    assert_eq!(last.extra["professionalId"], professional.id);
    assert!(last.extra.get("creationTime").is_some());
}

#[tokio::test]
async fn transitions_commit_when_nobody_listens_for_events() {
    let h = harness().await;
    let Harness {
        state,
        events,
        customer_id,
    } = h;
    drop(events);

    let offer = state
        .job_offer_service
        .create(NewJobOffer {
            customer_id,
            required_skills: vec!["go".into()],
            duration: 1,
            note: None,
        })
        .await
        .unwrap();
    let aborted = state
        .job_offer_service
        .change_status(offer.id, change(JobStatus::Abort, &[]))
        .await
        .unwrap();
    assert_eq!(aborted.status, JobStatus::Abort);
}

#[tokio::test]
async fn daily_rate_outside_stored_precision_is_rejected() {
    let h = harness().await;

    let err = assert_err!(h.register(Decimal::MAX).await);
    assert!(matches!(err, Error::BadRequest(_)));

    let err = assert_err!(h.register(Decimal::new(10_005, 3)).await);
    assert!(matches!(err, Error::BadRequest(_)));

    let trailing_zeros = assert_ok!(h.register(Decimal::new(100_000, 3)).await);
    assert_eq!(trailing_zeros.daily_rate, Decimal::from(100));
    assert_ok!(h.register(max_daily_rate()).await);
}

#[tokio::test]
async fn oversized_contract_value_fails_before_any_mutation() {
    let h = harness().await;
    let professional = assert_ok!(h.register(max_daily_rate()).await);
    let offer = h.proposed(1_000, &[professional.id]).await;

    let err = h
        .change(offer.id, JobStatus::Consolidated, &[professional.id])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));

    let unchanged = h.state.job_offer_service.get(offer.id).await.unwrap();
    assert_eq!(unchanged, offer);
    assert_eq!(
        h.employment_state(professional.id).await,
        EmploymentState::AvailableForWork
    );
}
