use crate::error::LeagueError;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};
use tracing::info;

// ── Capacity ───────────────────────────────────────────────────────────

impl LeagueSettings {
    /// Participant limit, `None` meaning unbounded. No plan means FREE.
    pub fn capacity(&self) -> Option<usize> {
        if self.is_unlimited == Some(true) {
            return None;
        }
        self.plan.unwrap_or(LeaguePlan::Free).capacity()
    }
}

impl League {
    pub fn capacity(&self) -> Option<usize> {
        self.settings.capacity()
    }

    pub fn is_deleted(&self) -> bool {
        self.name.contains(DELETED_LEAGUE_MARK)
    }

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }

    pub fn is_pending(&self, user_id: &str) -> bool {
        self.pending_requests.iter().any(|p| p == user_id)
    }

    pub fn is_full(&self) -> bool {
        match self.capacity() {
            Some(limit) => self.participants.len() >= limit,
            None => false,
        }
    }

    fn ensure_room(&self) -> Result<(), LeagueError> {
        match self.capacity() {
            Some(capacity) if self.participants.len() >= capacity => Err(LeagueError::LeagueFull { capacity }),
            _ => Ok(()),
        }
    }

    fn ensure_active(&self) -> Result<(), LeagueError> {
        if self.is_deleted() {
            Err(LeagueError::LeagueNotFound {
                league_id: self.id.clone(),
            })
        } else {
            Ok(())
        }
    }

    fn ensure_admin(&self, actor_id: &str) -> Result<(), LeagueError> {
        if self.admin_id == actor_id {
            Ok(())
        } else {
            Err(LeagueError::Forbidden {})
        }
    }

    fn add_participant(&mut self, user_id: &str) {
        self.pending_requests.retain(|p| p != user_id);
        if !self.is_participant(user_id) {
            self.participants.push(user_id.to_string());
        }
    }
}

// ── Lifecycle ──────────────────────────────────────────────────────────

/// New leagues always start on the FREE plan with the admin as sole member.
pub fn create(id: &str, name: &str, admin_id: &str, is_private: bool, settings: LeagueSettings) -> League {
    League {
        id: id.to_string(),
        name: name.trim().to_string(),
        admin_id: admin_id.to_string(),
        is_private,
        participants: vec![admin_id.to_string()],
        pending_requests: Vec::new(),
        settings: LeagueSettings {
            plan: Some(LeaguePlan::Free),
            is_unlimited: Some(false),
            ..settings
        },
    }
}

/// Point values only; the plan is not the admin's to change.
pub fn update_settings(league: &mut League, actor_id: &str, settings: LeagueSettings) -> Result<(), LeagueError> {
    league.ensure_active()?;
    league.ensure_admin(actor_id)?;
    league.settings = LeagueSettings {
        plan: league.settings.plan,
        is_unlimited: league.settings.is_unlimited,
        ..settings
    };
    Ok(())
}

pub fn delete(league: &mut League, actor_id: &str) -> Result<(), LeagueError> {
    league.ensure_active()?;
    league.ensure_admin(actor_id)?;
    league.name = format!("{} {DELETED_LEAGUE_MARK}", league.name);
    league.participants.clear();
    league.pending_requests.clear();
    Ok(())
}

// ── Membership policy ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JoinOutcome {
    Joined,
    RequestPending,
}

pub fn join(league: &mut League, user_id: &str) -> Result<JoinOutcome, LeagueError> {
    league.ensure_active()?;
    if league.is_participant(user_id) {
        return Err(LeagueError::AlreadyParticipant {});
    }
    league.ensure_room()?;
    if league.is_private {
        if league.is_pending(user_id) {
            return Err(LeagueError::RequestAlreadyPending {});
        }
        league.pending_requests.push(user_id.to_string());
        return Ok(JoinOutcome::RequestPending);
    }
    league.add_participant(user_id);
    Ok(JoinOutcome::Joined)
}

pub fn approve(league: &mut League, actor_id: &str, user_id: &str) -> Result<(), LeagueError> {
    league.ensure_admin(actor_id)?;
    if !league.is_pending(user_id) {
        return Err(LeagueError::NotPending {
            user_id: user_id.to_string(),
        });
    }
    league.ensure_room()?;
    league.add_participant(user_id);
    Ok(())
}

pub fn reject(league: &mut League, actor_id: &str, user_id: &str) -> Result<(), LeagueError> {
    league.ensure_admin(actor_id)?;
    if !league.is_pending(user_id) {
        return Err(LeagueError::NotPending {
            user_id: user_id.to_string(),
        });
    }
    league.pending_requests.retain(|p| p != user_id);
    Ok(())
}

/// The admin may remove anyone; any member may remove themselves.
pub fn remove_member(league: &mut League, actor_id: &str, user_id: &str) -> Result<(), LeagueError> {
    if league.admin_id != actor_id && actor_id != user_id {
        return Err(LeagueError::Forbidden {});
    }
    if !league.is_participant(user_id) {
        return Err(LeagueError::NotParticipant {
            user_id: user_id.to_string(),
        });
    }
    league.participants.retain(|p| p != user_id);
    Ok(())
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy)]
pub struct Invitee<'a> {
    pub email: &'a str,
    pub user_id: Option<&'a str>,
}

pub fn invite(
    league: &League,
    actor_id: &str,
    invitee: Invitee<'_>,
    outstanding: &[Invitation],
    invite_id: String,
) -> Result<Invitation, LeagueError> {
    league.ensure_active()?;
    league.ensure_admin(actor_id)?;
    if invitee.user_id.is_some_and(|id| league.is_participant(id)) {
        return Err(LeagueError::AlreadyParticipant {});
    }
    let email = normalize_email(invitee.email);
    let duplicate = outstanding
        .iter()
        .any(|inv| inv.league_id == league.id && inv.status == InviteStatus::Pending && inv.email == email);
    if duplicate {
        return Err(LeagueError::InviteAlreadySent { email });
    }
    league.ensure_room()?;
    Ok(Invitation {
        id: invite_id,
        league_id: league.id.clone(),
        email,
        status: InviteStatus::Pending,
    })
}

pub fn respond_to_invite(
    league: &mut League,
    invitation: &mut Invitation,
    user_id: &str,
    user_email: &str,
    accept: bool,
) -> Result<(), LeagueError> {
    if invitation.status != InviteStatus::Pending {
        return Err(LeagueError::InviteNotPending {
            invite_id: invitation.id.clone(),
        });
    }
    if normalize_email(&invitation.email) != normalize_email(user_email) {
        return Err(LeagueError::InviteEmailMismatch {});
    }
    if accept && !league.is_participant(user_id) {
        league.ensure_room()?;
        league.add_participant(user_id);
    }
    invitation.status = if accept {
        InviteStatus::Accepted
    } else {
        InviteStatus::Rejected
    };
    Ok(())
}

// ── Store ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeagueRegistry {
    pub leagues: BTreeMap<String, League>,
    pub invitations: Vec<Invitation>,
    pub next_invite_id: u64,
}

/// Shared league state. Every change runs the policy against a working copy
/// under the lock and commits only when it succeeds.
#[derive(Debug, Clone, Default)]
pub struct LeagueStore {
    inner: Arc<Mutex<LeagueRegistry>>,
}

impl LeagueStore {
    pub fn new(registry: LeagueRegistry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    pub fn from_leagues(leagues: Vec<League>) -> Self {
        let leagues = leagues.into_iter().map(|l| (l.id.clone(), l)).collect();
        Self::new(LeagueRegistry {
            leagues,
            ..LeagueRegistry::default()
        })
    }

    fn with_registry<F, R>(&self, f: F) -> Result<R, LeagueError>
    where
        F: FnOnce(&mut LeagueRegistry) -> Result<R, LeagueError>,
    {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| LeagueError::StoreUnavailable(e.to_string()))?;
        f(&mut guard)
    }

    pub fn snapshot(&self) -> Result<LeagueRegistry, LeagueError> {
        self.with_registry(|registry| Ok(registry.clone()))
    }

    pub fn create(
        &self,
        league_id: &str,
        name: &str,
        admin_id: &str,
        is_private: bool,
        settings: LeagueSettings,
    ) -> Result<League, LeagueError> {
        self.with_registry(|registry| {
            if registry.leagues.contains_key(league_id) {
                return Err(LeagueError::LeagueExists {
                    league_id: league_id.to_string(),
                });
            }
            let league = create(league_id, name, admin_id, is_private, settings);
            registry.leagues.insert(league.id.clone(), league.clone());
            info!(league_id, admin_id, "league created");
            Ok(league)
        })
    }

    pub fn list(&self) -> Result<Vec<League>, LeagueError> {
        self.with_registry(|registry| {
            Ok(registry
                .leagues
                .values()
                .filter(|league| !league.is_deleted())
                .cloned()
                .collect())
        })
    }

    pub fn get(&self, league_id: &str) -> Result<League, LeagueError> {
        self.with_registry(|registry| {
            registry
                .leagues
                .get(league_id)
                .cloned()
                .ok_or_else(|| LeagueError::LeagueNotFound {
                    league_id: league_id.to_string(),
                })
        })
    }

    /// Apply `f` to a copy of the league and write it back only on `Ok`.
    pub fn update<F, R>(&self, league_id: &str, f: F) -> Result<R, LeagueError>
    where
        F: FnOnce(&mut League) -> Result<R, LeagueError>,
    {
        self.with_registry(|registry| {
            let current = registry
                .leagues
                .get(league_id)
                .ok_or_else(|| LeagueError::LeagueNotFound {
                    league_id: league_id.to_string(),
                })?;
            let mut working = current.clone();
            let out = f(&mut working)?;
            registry.leagues.insert(league_id.to_string(), working);
            Ok(out)
        })
    }

    pub fn update_settings(&self, league_id: &str, actor_id: &str, settings: LeagueSettings) -> Result<(), LeagueError> {
        self.update(league_id, |league| update_settings(league, actor_id, settings))?;
        info!(league_id, "league settings updated");
        Ok(())
    }

    pub fn delete(&self, league_id: &str, actor_id: &str) -> Result<(), LeagueError> {
        self.update(league_id, |league| delete(league, actor_id))?;
        info!(league_id, "league deleted");
        Ok(())
    }

    pub fn join(&self, league_id: &str, user_id: &str) -> Result<JoinOutcome, LeagueError> {
        let outcome = self.update(league_id, |league| join(league, user_id))?;
        info!(league_id, user_id, ?outcome, "join");
        Ok(outcome)
    }

    pub fn approve(&self, league_id: &str, actor_id: &str, user_id: &str) -> Result<(), LeagueError> {
        self.update(league_id, |league| approve(league, actor_id, user_id))?;
        info!(league_id, user_id, "join request approved");
        Ok(())
    }

    pub fn reject(&self, league_id: &str, actor_id: &str, user_id: &str) -> Result<(), LeagueError> {
        self.update(league_id, |league| reject(league, actor_id, user_id))?;
        info!(league_id, user_id, "join request rejected");
        Ok(())
    }

    pub fn remove_member(&self, league_id: &str, actor_id: &str, user_id: &str) -> Result<(), LeagueError> {
        self.update(league_id, |league| remove_member(league, actor_id, user_id))?;
        info!(league_id, actor_id, user_id, "member removed");
        Ok(())
    }

    pub fn invite(&self, league_id: &str, actor_id: &str, invitee: Invitee<'_>) -> Result<Invitation, LeagueError> {
        self.with_registry(|registry| {
            let league = registry
                .leagues
                .get(league_id)
                .ok_or_else(|| LeagueError::LeagueNotFound {
                    league_id: league_id.to_string(),
                })?;
            let invite_id = format!("inv-{}", registry.next_invite_id + 1);
            let invitation = invite(league, actor_id, invitee, &registry.invitations, invite_id)?;
            registry.next_invite_id += 1;
            registry.invitations.push(invitation.clone());
            info!(league_id, invite_id = %invitation.id, "invitation created");
            Ok(invitation)
        })
    }

    pub fn invitations_for(&self, email: &str) -> Result<Vec<Invitation>, LeagueError> {
        let email = normalize_email(email);
        self.with_registry(|registry| {
            Ok(registry
                .invitations
                .iter()
                .filter(|inv| inv.status == InviteStatus::Pending && inv.email == email)
                .cloned()
                .collect())
        })
    }

    pub fn respond_to_invite(
        &self,
        invite_id: &str,
        user_id: &str,
        user_email: &str,
        accept: bool,
    ) -> Result<(), LeagueError> {
        self.with_registry(|registry| {
            let invite_idx = registry
                .invitations
                .iter()
                .position(|inv| inv.id == invite_id)
                .ok_or_else(|| LeagueError::InviteNotFound {
                    invite_id: invite_id.to_string(),
                })?;
            let mut invitation = registry.invitations[invite_idx].clone();
            let mut league = registry
                .leagues
                .get(&invitation.league_id)
                .cloned()
                .ok_or_else(|| LeagueError::LeagueNotFound {
                    league_id: invitation.league_id.clone(),
                })?;
            respond_to_invite(&mut league, &mut invitation, user_id, user_email, accept)?;
            info!(invite_id, user_id, accept, "invitation answered");
            registry.leagues.insert(league.id.clone(), league);
            registry.invitations[invite_idx] = invitation;
            Ok(())
        })
    }
}
