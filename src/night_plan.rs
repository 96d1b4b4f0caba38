//! 夜晚步骤表（Night-Step Table）与夜晚计划构建器（Night-Plan Builder）。
//!
//! 步骤表是权威的第一夜顺序；构建器把模板的角色列表投影到步骤表上，按标签
//! 重排预言家类步骤，并对未知角色快速失败。

use crate::role::{RoleId, SchemaId};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct StepDescriptor {
    pub role_id: RoleId,
    pub step_id: SchemaId,
    pub display_name: &'static str,
    pub audio_key: &'static str,
}

#[derive(Debug, Clone)]
pub struct NightStep {
    pub role_id: RoleId,
    pub step_id: SchemaId,
    pub order: u32,
    pub display_name: &'static str,
    pub audio_key: &'static str,
}

/// 第一夜的权威顺序。噩梦/守卫必须先于它们能封印/守护的行动；女巫在狼刀之
/// 后以便看到死讯决定是否救人；魔术师的座位互换必须在预言家类查验之前生
/// 效，否则同一晚的查验读不到互换后的身份（见 `resolve_role_for_checks`）；
/// 预言家类分组在一起，组内再按标签重排；吹笛者魅惑影响的是下一个白天，放
/// 在本夜顺序的最后。
fn canonical_table() -> Vec<StepDescriptor> {
    use RoleId::*;
    use SchemaId::*;
    vec![
        StepDescriptor { role_id: NightmareWolf, step_id: NightmareBlock, display_name: "噩梦之狼", audio_key: "nightmare_wolf" },
        StepDescriptor { role_id: Guard, step_id: GuardProtect, display_name: "守卫", audio_key: "guard" },
        // wolfKill 的角色占位用 Werewolf：实际是否纳入由“是否存在
        // participatesInWolfVote 的角色”决定，而非单看 Werewolf 是否在模板中。
        StepDescriptor { role_id: Werewolf, step_id: WolfKill, display_name: "狼人", audio_key: "wolf" },
        StepDescriptor { role_id: WolfQueen, step_id: WolfQueenCharm, display_name: "狼美人", audio_key: "wolf_queen" },
        StepDescriptor { role_id: WolfRobot, step_id: WolfRobotLearn, display_name: "机械狼", audio_key: "wolf_robot" },
        StepDescriptor { role_id: Witch, step_id: WitchAction, display_name: "女巫", audio_key: "witch" },
        StepDescriptor { role_id: Magician, step_id: MagicianSwap, display_name: "魔术师", audio_key: "magician" },
        StepDescriptor { role_id: Seer, step_id: SeerCheck, display_name: "预言家", audio_key: "seer" },
        StepDescriptor { role_id: MirrorSeer, step_id: MirrorSeerCheck, display_name: "镜像预言家", audio_key: "mirror_seer" },
        StepDescriptor { role_id: DrunkSeer, step_id: DrunkSeerCheck, display_name: "醉酒预言家", audio_key: "drunk_seer" },
        StepDescriptor { role_id: Psychic, step_id: PsychicCheck, display_name: "通灵师", audio_key: "psychic" },
        StepDescriptor { role_id: Gargoyle, step_id: GargoyleCheck, display_name: "石像鬼", audio_key: "gargoyle" },
        StepDescriptor { role_id: PureWhite, step_id: PureWhiteCheck, display_name: "纯白之女", audio_key: "pure_white" },
        StepDescriptor { role_id: WolfWitch, step_id: WolfWitchCheck, display_name: "狼巫", audio_key: "wolf_witch" },
        StepDescriptor { role_id: Piper, step_id: PiperHypnotize, display_name: "吹笛者", audio_key: "piper" },
    ]
}

/// 这组角色 id 属于"预言家类"——它们的相对顺序由 `seerLabelMap` 决定。
pub fn is_seer_like(role_id: RoleId) -> bool {
    matches!(
        role_id,
        RoleId::Seer
            | RoleId::MirrorSeer
            | RoleId::DrunkSeer
            | RoleId::Psychic
            | RoleId::Gargoyle
            | RoleId::PureWhite
            | RoleId::WolfWitch
    )
}

#[derive(Debug, thiserror::Error)]
pub enum NightPlanError {
    #[error("unknown role id in template: {0:?}")]
    UnknownRole(RoleId),
}

/// 构建本夜的计划：遍历权威步骤表，保留模板中出现的角色的步骤；`wolfKill`
/// 特判为"模板中存在任意 participatesInWolfVote 的角色"即纳入。若提供了
/// `seer_label_map`，预言家类步骤按标签升序重排，其余步骤保持表内顺序。
pub fn build_night_plan(
    template_roles: &[RoleId],
    role_registry: &HashMap<RoleId, crate::role::Role>,
    seer_label_map: &HashMap<RoleId, u8>,
) -> Result<Vec<NightStep>, NightPlanError> {
    for role_id in template_roles {
        if !role_registry.contains_key(role_id) {
            return Err(NightPlanError::UnknownRole(*role_id));
        }
    }

    let present: std::collections::HashSet<RoleId> = template_roles.iter().copied().collect();
    let any_wolf_votes = template_roles.iter().any(|r| {
        role_registry
            .get(r)
            .and_then(|role| role.wolf_meeting)
            .map(|m| m.participates_in_wolf_vote)
            .unwrap_or(false)
    });

    let mut ordered = Vec::new();
    let mut seer_like_steps = Vec::new();
    // 预言家类步骤插回的位置固定取它们在 `canonical_table()` 里出现的下标
    // (紧跟魔术师之后),不依赖模板里是否存在女巫或魔术师本身——这样魔术师与
    // 预言家的相对顺序在任意模板下都是确定的,同一晚的查验总能读到互换后的
    // 身份。
    let mut seer_insert_index = None;

    for descriptor in canonical_table() {
        if is_seer_like(descriptor.role_id) {
            if seer_insert_index.is_none() {
                seer_insert_index = Some(ordered.len());
            }
            if present.contains(&descriptor.role_id) {
                seer_like_steps.push(descriptor);
            }
            continue;
        }
        let included = if descriptor.step_id == SchemaId::WolfKill {
            any_wolf_votes
        } else {
            present.contains(&descriptor.role_id)
        };
        if included {
            ordered.push(descriptor);
        }
    }

    if !seer_label_map.is_empty() {
        seer_like_steps.sort_by_key(|d| seer_label_map.get(&d.role_id).copied().unwrap_or(u8::MAX));
    }

    let insert_at = seer_insert_index.unwrap_or(ordered.len()).min(ordered.len());
    let tail = ordered.split_off(insert_at);
    ordered.extend(seer_like_steps);
    ordered.extend(tail);

    Ok(ordered
        .into_iter()
        .enumerate()
        .map(|(i, d)| NightStep {
            role_id: d.role_id,
            step_id: d.step_id,
            order: i as u32,
            display_name: d.display_name,
            audio_key: d.audio_key,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::registry;

    #[test]
    fn plan_includes_wolf_kill_when_any_vote_participant_present() {
        let reg = registry();
        let template = vec![RoleId::DarkWolfKing, RoleId::Villager, RoleId::Villager];
        let plan = build_night_plan(&template, &reg, &HashMap::new()).unwrap();
        assert!(plan.iter().any(|s| s.step_id == SchemaId::WolfKill));
    }

    #[test]
    fn plan_excludes_steps_for_absent_roles() {
        let reg = registry();
        let template = vec![RoleId::Villager, RoleId::Villager, RoleId::Villager];
        let plan = build_night_plan(&template, &reg, &HashMap::new()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn seer_like_steps_reordered_by_label() {
        let reg = registry();
        let template = vec![RoleId::Seer, RoleId::Psychic, RoleId::Villager];
        let mut labels = HashMap::new();
        labels.insert(RoleId::Psychic, 1u8);
        labels.insert(RoleId::Seer, 2u8);
        let plan = build_night_plan(&template, &reg, &labels).unwrap();
        let seer_like: Vec<_> = plan
            .iter()
            .filter(|s| matches!(s.role_id, RoleId::Seer | RoleId::Psychic))
            .collect();
        assert_eq!(seer_like[0].role_id, RoleId::Psychic);
        assert_eq!(seer_like[1].role_id, RoleId::Seer);
    }

    #[test]
    fn wolf_queen_charm_step_included_right_after_wolf_kill() {
        let reg = registry();
        let template = vec![RoleId::WolfQueen, RoleId::Villager, RoleId::Villager];
        let plan = build_night_plan(&template, &reg, &HashMap::new()).unwrap();
        let kill_pos = plan.iter().position(|s| s.step_id == SchemaId::WolfKill).unwrap();
        let charm_pos = plan.iter().position(|s| s.step_id == SchemaId::WolfQueenCharm).unwrap();
        assert_eq!(charm_pos, kill_pos + 1);
    }

    #[test]
    fn magician_always_precedes_seer_like_steps_regardless_of_witch_presence() {
        let reg = registry();

        let without_witch = vec![RoleId::Werewolf, RoleId::Villager, RoleId::Villager, RoleId::Seer, RoleId::Magician];
        let plan = build_night_plan(&without_witch, &reg, &HashMap::new()).unwrap();
        let magician_pos = plan.iter().position(|s| s.step_id == SchemaId::MagicianSwap).unwrap();
        let seer_pos = plan.iter().position(|s| s.step_id == SchemaId::SeerCheck).unwrap();
        assert!(magician_pos < seer_pos);

        let with_witch = vec![RoleId::Werewolf, RoleId::Witch, RoleId::Seer, RoleId::Magician];
        let plan = build_night_plan(&with_witch, &reg, &HashMap::new()).unwrap();
        let magician_pos = plan.iter().position(|s| s.step_id == SchemaId::MagicianSwap).unwrap();
        let seer_pos = plan.iter().position(|s| s.step_id == SchemaId::SeerCheck).unwrap();
        assert!(magician_pos < seer_pos);
    }

    #[test]
    fn unknown_role_fails_fast() {
        let reg = registry();
        // DarkWolfKing removed from registry would be unknown; simulate by
        // passing an empty registry instead.
        let template = vec![RoleId::Villager];
        let empty = HashMap::new();
        let err = build_night_plan(&template, &empty, &HashMap::new()).unwrap_err();
        matches!(err, NightPlanError::UnknownRole(_));
        let _ = reg;
    }
}
