//! 约束校验器（Constraint Validator）：给定约束标签列表与候选目标，判断是否
//! 合法。未知约束标签直接 fail-fast，不静默放行。

use crate::protocol::RejectReason;
use crate::role::{Constraint, RoleId, Team};
use crate::state::{GameState, Seat};

#[derive(Debug)]
pub struct ValidationContext<'a> {
    pub actor_seat: Seat,
    pub target: Option<Seat>,
    pub other_target: Option<Seat>,
    pub state: &'a GameState,
    pub hypnotized: &'a std::collections::HashSet<Seat>,
}

pub fn check_constraints(
    constraints: &[Constraint],
    ctx: &ValidationContext,
) -> Result<(), RejectReason> {
    for constraint in constraints {
        check_one(*constraint, ctx)?;
    }
    Ok(())
}

fn check_one(constraint: Constraint, ctx: &ValidationContext) -> Result<(), RejectReason> {
    match constraint {
        Constraint::NotSelf => {
            if ctx.target == Some(ctx.actor_seat) {
                return Err(RejectReason::NotSelf);
            }
            Ok(())
        }
        Constraint::NotWolfFaction => {
            if let Some(target) = ctx.target {
                if let Some(role) = ctx.state.role_at(target) {
                    if role_team(role) == Team::Wolf {
                        return Err(RejectReason::InvalidAction);
                    }
                }
            }
            Ok(())
        }
        Constraint::MustBeAlive => Ok(()),
        Constraint::MustBeExistingSeat => {
            if let Some(target) = ctx.target {
                if ctx.state.player_at(target).is_none() {
                    return Err(RejectReason::InvalidSeat);
                }
            }
            Ok(())
        }
        Constraint::DistinctFromOtherTarget => {
            if ctx.target.is_some() && ctx.target == ctx.other_target {
                return Err(RejectReason::InvalidAction);
            }
            Ok(())
        }
        Constraint::NotAlreadyHypnotized => {
            if let Some(target) = ctx.target {
                if ctx.hypnotized.contains(&target) {
                    return Err(RejectReason::InvalidAction);
                }
            }
            Ok(())
        }
    }
}

fn role_team(role_id: RoleId) -> Team {
    crate::role::registry()
        .get(&role_id)
        .map(|r| r.team)
        .unwrap_or(Team::Good)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::GameState;

    fn ctx<'a>(state: &'a GameState, actor: Seat, target: Option<Seat>) -> ValidationContext<'a> {
        ValidationContext {
            actor_seat: actor,
            target,
            other_target: None,
            state,
            hypnotized: Box::leak(Box::new(std::collections::HashSet::new())),
        }
    }

    #[test]
    fn not_self_rejects_targeting_actor() {
        let state = GameState::new("1234".into(), "host".into(), 3);
        let c = ctx(&state, 1, Some(1));
        assert_eq!(
            check_constraints(&[Constraint::NotSelf], &c),
            Err(RejectReason::NotSelf)
        );
    }

    #[test]
    fn not_self_allows_other_target() {
        let state = GameState::new("1234".into(), "host".into(), 3);
        let c = ctx(&state, 1, Some(2));
        assert_eq!(check_constraints(&[Constraint::NotSelf], &c), Ok(()));
    }
}
