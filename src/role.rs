//! 角色注册表与动作模式注册表（Role Registry & Schema Registry）。
//!
//! 纯数据声明：每个角色是一条不可变记录，不持有任何运行时状态。角色通过
//! `RoleId` 被其它模块引用，从不直接嵌入角色结构体，避免循环引用。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoleId {
    Villager,
    Werewolf,
    WolfQueen,
    WolfRobot,
    NightmareWolf,
    WolfWitch,
    Seer,
    MirrorSeer,
    DrunkSeer,
    Psychic,
    Gargoyle,
    PureWhite,
    Witch,
    Guard,
    Hunter,
    DarkWolfKing,
    Magician,
    SpiritKnight,
    Piper,
    Dreamcatcher,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Faction {
    Wolf,
    God,
    Villager,
    Special,
}

/// 阵营分类与身份查验结果是两回事：查验结果只看 `Team`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Team {
    Wolf,
    Good,
    /// 第三方阵营在查验中仍记为好人。
    Third,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WolfMeeting {
    pub can_see_wolves: bool,
    pub participates_in_wolf_vote: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RoleFlags {
    pub immune_to_wolf_kill: bool,
    pub immune_to_poison: bool,
    pub reflects_damage: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub display_name: &'static str,
    pub short_name: &'static str,
    pub emoji: &'static str,
    pub faction: Faction,
    pub team: Team,
    pub has_night_action: bool,
    pub wolf_meeting: Option<WolfMeeting>,
    pub flags: RoleFlags,
    /// 静态伪装：该角色本身总是以另一身份展示。WolfRobot 的伪装是运行时
    /// 学习到的，不在这里声明，保持 `None`。
    pub display_as: Option<RoleId>,
}

fn wolf_meeting(votes: bool) -> Option<WolfMeeting> {
    Some(WolfMeeting {
        can_see_wolves: true,
        participates_in_wolf_vote: votes,
    })
}

impl Role {
    const fn base(
        id: RoleId,
        display_name: &'static str,
        short_name: &'static str,
        emoji: &'static str,
        faction: Faction,
        team: Team,
    ) -> Role {
        Role {
            id,
            display_name,
            short_name,
            emoji,
            faction,
            team,
            has_night_action: false,
            wolf_meeting: None,
            flags: RoleFlags {
                immune_to_wolf_kill: false,
                immune_to_poison: false,
                reflects_damage: false,
            },
            display_as: None,
        }
    }
}

/// 角色注册表：以 `RoleId` 为键的声明式记录集合，进程内只构建一次。
pub fn registry() -> HashMap<RoleId, Role> {
    use Faction::*;
    use RoleId::*;
    use Team::*;

    let mut roles = HashMap::new();

    roles.insert(Villager, Role::base(Villager, "村民", "民", "🧑‍🌾", Villager, Good));

    let mut werewolf = Role::base(Werewolf, "狼人", "狼", "🐺", Wolf, Wolf);
    werewolf.has_night_action = true;
    werewolf.wolf_meeting = wolf_meeting(true);
    roles.insert(Werewolf, werewolf);

    let mut wolf_queen = Role::base(WolfQueen, "狼美人", "美", "👑", Wolf, Wolf);
    wolf_queen.has_night_action = true;
    wolf_queen.wolf_meeting = wolf_meeting(true);
    roles.insert(WolfQueen, wolf_queen);

    let mut wolf_robot = Role::base(WolfRobot, "机械狼", "机", "🤖", Wolf, Wolf);
    wolf_robot.has_night_action = true;
    wolf_robot.wolf_meeting = wolf_meeting(true);
    roles.insert(WolfRobot, wolf_robot);

    let mut nightmare_wolf = Role::base(NightmareWolf, "噩梦之狼", "噩", "💤", Wolf, Wolf);
    nightmare_wolf.has_night_action = true;
    nightmare_wolf.wolf_meeting = wolf_meeting(true);
    roles.insert(NightmareWolf, nightmare_wolf);

    let mut wolf_witch = Role::base(WolfWitch, "狼巫", "巫", "🧪", Special, Wolf);
    wolf_witch.has_night_action = true;
    wolf_witch.wolf_meeting = Some(WolfMeeting {
        can_see_wolves: true,
        participates_in_wolf_vote: false,
    });
    roles.insert(WolfWitch, wolf_witch);

    let mut seer = Role::base(Seer, "预言家", "预", "🔮", God, Good);
    seer.has_night_action = true;
    roles.insert(Seer, seer);

    let mut mirror_seer = Role::base(MirrorSeer, "镜像预言家", "镜", "🪞", God, Good);
    mirror_seer.has_night_action = true;
    roles.insert(MirrorSeer, mirror_seer);

    let mut drunk_seer = Role::base(DrunkSeer, "醉酒预言家", "醉", "🍶", God, Good);
    drunk_seer.has_night_action = true;
    roles.insert(DrunkSeer, drunk_seer);

    let mut psychic = Role::base(Psychic, "通灵师", "通", "🧿", God, Good);
    psychic.has_night_action = true;
    roles.insert(Psychic, psychic);

    let mut gargoyle = Role::base(Gargoyle, "石像鬼", "石", "🗿", God, Good);
    gargoyle.has_night_action = true;
    roles.insert(Gargoyle, gargoyle);

    let mut pure_white = Role::base(PureWhite, "纯白之女", "纯", "🕊️", God, Good);
    pure_white.has_night_action = true;
    pure_white.flags.reflects_damage = true;
    roles.insert(PureWhite, pure_white);

    let mut witch = Role::base(Witch, "女巫", "女", "🧙", God, Good);
    witch.has_night_action = true;
    roles.insert(Witch, witch);

    let mut guard = Role::base(Guard, "守卫", "守", "🛡️", God, Good);
    guard.has_night_action = true;
    roles.insert(Guard, guard);

    roles.insert(Hunter, Role::base(Hunter, "猎人", "猎", "🏹", God, Good));

    let mut dark_wolf_king = Role::base(DarkWolfKing, "黑狼王", "黑", "👹", Wolf, Wolf);
    dark_wolf_king.has_night_action = true;
    dark_wolf_king.wolf_meeting = wolf_meeting(true);
    roles.insert(DarkWolfKing, dark_wolf_king);

    let mut magician = Role::base(Magician, "魔术师", "魔", "🎩", God, Good);
    magician.has_night_action = true;
    roles.insert(Magician, magician);

    let mut spirit_knight = Role::base(SpiritKnight, "恶灵骑士", "恶", "⚔️", God, Good);
    spirit_knight.flags.immune_to_wolf_kill = true;
    roles.insert(SpiritKnight, spirit_knight);

    let mut piper = Role::base(Piper, "吹笛者", "笛", "🎵", Special, Third);
    piper.has_night_action = true;
    roles.insert(Piper, piper);

    roles.insert(Dreamcatcher, Role::base(Dreamcatcher, "摄梦人", "梦", "💭", God, Good));

    roles
}

/// 查验规则：好人阵营与第三方一律显示"好人"，只有 `Team::Wolf` 显示"狼人"。
pub fn seer_check_label(team: Team) -> &'static str {
    match team {
        Team::Wolf => "狼人",
        Team::Good | Team::Third => "好人",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SchemaId {
    NightmareBlock,
    GuardProtect,
    WolfKill,
    WolfQueenCharm,
    WolfRobotLearn,
    WitchAction,
    SeerCheck,
    MirrorSeerCheck,
    DrunkSeerCheck,
    PsychicCheck,
    GargoyleCheck,
    PureWhiteCheck,
    WolfWitchCheck,
    MagicianSwap,
    PiperHypnotize,
    DarkWolfKingConfirm,
    HunterConfirm,
    PiperHypnotizedReveal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaKind {
    ChooseSeat,
    ChooseMultiSeat,
    Compound,
    Confirm,
    WolfVote,
    GroupConfirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constraint {
    NotSelf,
    NotWolfFaction,
    MustBeAlive,
    MustBeExistingSeat,
    DistinctFromOtherTarget,
    NotAlreadyHypnotized,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiHints {
    pub prompt: &'static str,
    pub confirm_title: &'static str,
    pub confirm_text: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSchema {
    pub id: SchemaId,
    pub kind: SchemaKind,
    pub constraints: Vec<Constraint>,
    pub can_skip: bool,
    pub min_targets: u8,
    pub max_targets: u8,
    pub ui: UiHints,
}

fn schema(
    id: SchemaId,
    kind: SchemaKind,
    constraints: &[Constraint],
    can_skip: bool,
    min_targets: u8,
    max_targets: u8,
    prompt: &'static str,
    confirm_title: &'static str,
    confirm_text: &'static str,
) -> ActionSchema {
    ActionSchema {
        id,
        kind,
        constraints: constraints.to_vec(),
        can_skip,
        min_targets,
        max_targets,
        ui: UiHints {
            prompt,
            confirm_title,
            confirm_text,
        },
    }
}

pub fn schema_registry() -> HashMap<SchemaId, ActionSchema> {
    use Constraint::*;
    use SchemaId::*;
    use SchemaKind::*;

    let mut schemas = HashMap::new();

    schemas.insert(
        NightmareBlock,
        schema(NightmareBlock, ChooseSeat, &[], true, 1, 1, "请选择要封印的玩家", "确认封印", "确定封印该玩家的技能吗？"),
    );
    schemas.insert(
        GuardProtect,
        schema(GuardProtect, ChooseSeat, &[], true, 1, 1, "请选择要守护的玩家", "确认守护", "确定守护该玩家吗？"),
    );
    schemas.insert(
        WolfKill,
        schema(WolfKill, WolfVote, &[], true, 1, 1, "请选择今晚的目标", "确认刀人", "确定对该玩家动手吗？"),
    );
    schemas.insert(
        WolfQueenCharm,
        schema(WolfQueenCharm, ChooseSeat, &[NotSelf], true, 1, 1, "请选择要魅惑的对象", "确认魅惑", "确定魅惑该玩家吗？一旦你今晚死亡，对方也会殉情。"),
    );
    schemas.insert(
        WolfRobotLearn,
        schema(WolfRobotLearn, ChooseSeat, &[NotSelf], false, 1, 1, "请选择要学习的身份", "确认学习", "确定学习该玩家的身份吗？"),
    );
    schemas.insert(
        WitchAction,
        schema(WitchAction, Compound, &[NotSelf], true, 0, 1, "请选择救人或毒人", "确认行动", "确定执行该行动吗？"),
    );
    schemas.insert(
        SeerCheck,
        schema(SeerCheck, ChooseSeat, &[NotSelf], false, 1, 1, "请选择要查验的玩家", "确认查验", "确定查验该玩家的身份吗？"),
    );
    schemas.insert(
        MirrorSeerCheck,
        schema(MirrorSeerCheck, ChooseSeat, &[NotSelf], false, 1, 1, "请选择要查验的玩家", "确认查验", "确定查验该玩家的身份吗？"),
    );
    schemas.insert(
        DrunkSeerCheck,
        schema(DrunkSeerCheck, ChooseSeat, &[NotSelf], false, 1, 1, "请选择要查验的玩家", "确认查验", "确定查验该玩家的身份吗？"),
    );
    schemas.insert(
        PsychicCheck,
        schema(PsychicCheck, ChooseSeat, &[NotSelf], false, 1, 1, "请选择要通灵的玩家", "确认通灵", "确定通灵该玩家吗？"),
    );
    schemas.insert(
        GargoyleCheck,
        schema(GargoyleCheck, ChooseSeat, &[NotSelf], false, 1, 1, "请选择要查验的玩家", "确认查验", "确定查验该玩家的身份吗？"),
    );
    schemas.insert(
        PureWhiteCheck,
        schema(PureWhiteCheck, ChooseSeat, &[NotSelf], false, 1, 1, "请选择要查验的玩家", "确认查验", "确定查验该玩家的身份吗？"),
    );
    schemas.insert(
        WolfWitchCheck,
        schema(WolfWitchCheck, ChooseSeat, &[NotSelf], false, 1, 1, "请选择要查验的玩家", "确认查验", "确定查验该玩家的身份吗？"),
    );
    schemas.insert(
        MagicianSwap,
        schema(MagicianSwap, ChooseMultiSeat, &[DistinctFromOtherTarget], true, 2, 2, "请选择要交换的两名玩家", "确认交换", "确定交换这两名玩家的座位吗？"),
    );
    schemas.insert(
        PiperHypnotize,
        schema(PiperHypnotize, ChooseMultiSeat, &[NotAlreadyHypnotized], false, 1, 2, "请选择要魅惑的玩家", "确认魅惑", "确定魅惑这些玩家吗？"),
    );
    schemas.insert(
        DarkWolfKingConfirm,
        schema(DarkWolfKingConfirm, Confirm, &[], false, 0, 0, "是否确认开枪能力状态", "确认", "确认"),
    );
    schemas.insert(
        HunterConfirm,
        schema(HunterConfirm, Confirm, &[], false, 0, 0, "是否确认开枪能力状态", "确认", "确认"),
    );
    schemas.insert(
        PiperHypnotizedReveal,
        schema(PiperHypnotizedReveal, GroupConfirm, &[], false, 0, 0, "请确认已知晓同伴身份", "确认", "确认"),
    );

    schemas
}
