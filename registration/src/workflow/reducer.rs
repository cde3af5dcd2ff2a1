//! Reducer deciding a registration attempt.
//!
//! Rule order: closed, invalid, duplicate, waitlisted, confirmed. Each storage
//! round trip is an effect whose result comes back as an action.

use super::actions::RegistrationAction;
use super::environment::RegistrationEnvironment;
use super::types::{Phase, RegistrationError, RegistrationOutcome, RegistrationState};
use crate::eligibility;
use crate::notify::DuplicateRegistration;
use crate::store::Placement;
use crate::types::{NewParticipant, Participant};
use crate::validation;
use firmenlauf_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use std::sync::Arc;

type Effects = SmallVec<[Effect<RegistrationAction>; 4]>;

/// Reducer for one registration attempt
#[derive(Clone, Copy, Debug, Default)]
pub struct RegistrationReducer;

impl RegistrationReducer {
    /// Create a new registration reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn complete(
        state: &mut RegistrationState,
        outcome: RegistrationOutcome,
    ) -> Effect<RegistrationAction> {
        tracing::debug!(outcome = outcome.as_str(), "Registration decided");
        state.phase = Phase::Completed;
        state.outcome = Some(outcome.clone());
        Effect::future(async move { Some(RegistrationAction::Completed { outcome }) })
    }

    fn fail(
        state: &mut RegistrationState,
        error: RegistrationError,
    ) -> Effect<RegistrationAction> {
        tracing::warn!(%error, "Registration failed");
        state.phase = Phase::Failed;
        state.error = Some(error.clone());
        Effect::future(async move { Some(RegistrationAction::Failed { error }) })
    }

    fn notify_duplicate(
        state: &RegistrationState,
        existing: &Participant,
        env: &RegistrationEnvironment,
    ) -> Effect<RegistrationAction> {
        let (Some(notifier), Some(event), Some(applicant)) =
            (env.notifier.clone(), state.event.as_ref(), state.valid.as_ref())
        else {
            return Effect::None;
        };

        let notice = DuplicateRegistration {
            event_id: event.id,
            event_name: event.name.clone(),
            applicant: applicant.duplicate_key(),
            applicant_email: applicant.email.clone(),
            existing_participant_id: existing.id,
        };
        let admin_email = env.admin_email.clone();

        Effect::future(async move {
            if let Err(error) = notifier.duplicate_registration(&admin_email, &notice).await {
                tracing::warn!(%error, "Failed to deliver duplicate notice");
                crate::metrics::record_notification_failed();
            }
            None
        })
    }

    fn duplicate(
        state: &mut RegistrationState,
        existing: Participant,
        env: &RegistrationEnvironment,
    ) -> Effects {
        let notify = Self::notify_duplicate(state, &existing, env);
        let done = Self::complete(state, RegistrationOutcome::Duplicate { existing });
        smallvec![Effect::merge(vec![notify, done])]
    }

    fn store(
        state: &mut RegistrationState,
        on_waiting_list: bool,
        env: &RegistrationEnvironment,
    ) -> Effects {
        let (Some(event_id), Some(applicant)) = (state.event_id, state.valid.clone()) else {
            return smallvec![Effect::None];
        };
        state.phase = Phase::Storing;

        let new = NewParticipant {
            event_id,
            applicant,
            on_waiting_list,
            registered_at: env.clock.now(),
        };
        let repository = Arc::clone(&env.repository);

        smallvec![Effect::future(async move {
            Some(match repository.create_participant(new).await {
                Ok(placement) => RegistrationAction::ParticipantStored { placement },
                Err(error) => RegistrationAction::StorageFailed { error },
            })
        })]
    }
}

impl Reducer for RegistrationReducer {
    type State = RegistrationState;
    type Action = RegistrationAction;
    type Environment = RegistrationEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per workflow step
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects {
        match action {
            RegistrationAction::Submit {
                event_id,
                applicant,
                today,
            } => {
                if state.phase != Phase::Idle {
                    tracing::warn!(phase = ?state.phase, "Ignoring resubmission");
                    return smallvec![Effect::None];
                }

                state.phase = Phase::Received;
                state.event_id = Some(event_id);
                state.today = Some(today.unwrap_or_else(|| env.clock.today()));
                state.applicant = Some(applicant);

                let repository = Arc::clone(&env.repository);
                smallvec![Effect::future(async move {
                    Some(match repository.get_event(event_id).await {
                        Ok(Some(event)) => RegistrationAction::EventLoaded { event },
                        Ok(None) => RegistrationAction::EventMissing,
                        Err(error) => RegistrationAction::StorageFailed { error },
                    })
                })]
            },

            RegistrationAction::EventLoaded { event } => {
                if state.phase != Phase::Received {
                    return smallvec![Effect::None];
                }
                let (Some(today), Some(applicant)) = (state.today, state.applicant.as_ref()) else {
                    return smallvec![Effect::None];
                };

                let open = event.is_registration_open(today);
                let validated = validation::validate(applicant, env.config.birth_years);
                let event_id = event.id;
                state.event = Some(event);

                if !open {
                    return smallvec![Self::complete(state, RegistrationOutcome::Closed)];
                }

                state.phase = Phase::Validating;
                let valid = match validated {
                    Ok(valid) => valid,
                    Err(errors) => {
                        return smallvec![Self::complete(
                            state,
                            RegistrationOutcome::Invalid { errors }
                        )];
                    },
                };

                let key = valid.duplicate_key();
                state.valid = Some(valid);

                let repository = Arc::clone(&env.repository);
                smallvec![Effect::future(async move {
                    let found =
                        eligibility::find_duplicate(repository.as_ref(), event_id, &key).await;
                    Some(match found {
                        Ok(existing) => RegistrationAction::DuplicateChecked { existing },
                        Err(error) => RegistrationAction::StorageFailed { error },
                    })
                })]
            },

            RegistrationAction::EventMissing => {
                if state.phase != Phase::Received {
                    return smallvec![Effect::None];
                }
                let Some(event_id) = state.event_id else {
                    return smallvec![Effect::None];
                };
                smallvec![Self::fail(state, RegistrationError::EventNotFound(event_id))]
            },

            RegistrationAction::DuplicateChecked { existing } => {
                if state.phase != Phase::Validating {
                    return smallvec![Effect::None];
                }
                if let Some(existing) = existing {
                    return Self::duplicate(state, existing, env);
                }

                let Some(event) = state.event.as_ref() else {
                    return smallvec![Effect::None];
                };
                if event.max_participants.is_none() {
                    return Self::store(state, false, env);
                }

                let event = event.clone();
                let repository = Arc::clone(&env.repository);
                smallvec![Effect::future(async move {
                    let checked = eligibility::has_available_spots(repository.as_ref(), &event).await;
                    Some(match checked {
                        Ok(available) => RegistrationAction::SpotsChecked { available },
                        Err(error) => RegistrationAction::StorageFailed { error },
                    })
                })]
            },

            RegistrationAction::SpotsChecked { available } => {
                if state.phase != Phase::Validating {
                    return smallvec![Effect::None];
                }
                Self::store(state, !available, env)
            },

            RegistrationAction::ParticipantStored { placement } => {
                if state.phase != Phase::Storing {
                    return smallvec![Effect::None];
                }
                match placement {
                    Placement::Created(participant) if participant.on_waiting_list => {
                        smallvec![Self::complete(
                            state,
                            RegistrationOutcome::Waitlisted { participant }
                        )]
                    },
                    Placement::Created(participant) => {
                        smallvec![Self::complete(
                            state,
                            RegistrationOutcome::Confirmed { participant }
                        )]
                    },
                    Placement::Duplicate(existing) => Self::duplicate(state, existing, env),
                }
            },

            RegistrationAction::Expired => {
                if state.phase == Phase::Storing || state.is_finished() {
                    return smallvec![Effect::None];
                }
                smallvec![Self::fail(state, RegistrationError::Timeout)]
            },

            RegistrationAction::StorageFailed { error } => {
                if state.is_finished() {
                    return smallvec![Effect::None];
                }
                smallvec![Self::fail(state, error.into())]
            },

            // Terminal actions only signal observers
            RegistrationAction::Completed { .. } | RegistrationAction::Failed { .. } => {
                smallvec![Effect::None]
            },
        }
    }
}
