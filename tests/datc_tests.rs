//! DATC (Diplomacy Adjudicator Test Cases) compliance tests.
//!
//! Each case sets up a position in DFEN, submits DSON orders and runs the
//! full adjudication pipeline: validation, default orders, resolution,
//! paradox handling and the next position.
//!
//! Sections covered: 6.A (basic), 6.B (coastal), 6.C (circular),
//! 6.D (supports), 6.E (head-to-head), 6.F (convoys), 6.G (convoying to
//! adjacent places), 6.H (retreats), 6.I (builds) and civil disorder.

use tribunal::board::{Coast, ProvinceId, Unit, UnitType, WorldMap};
use tribunal::protocol::{parse_dfen, parse_orders};
use tribunal::resolve::{adjudicate, Adjudication, OrderResult, TurnState};
use tribunal::rules::RuleOptions;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn map() -> &'static WorldMap {
    WorldMap::standard()
}

fn p(abbr: &str) -> ProvinceId {
    map()
        .province(abbr)
        .unwrap_or_else(|| panic!("unknown province {abbr}"))
}

struct Case {
    turn: TurnState,
    previous: Option<TurnState>,
    rules: RuleOptions,
}

impl Case {
    fn new(dfen: &str) -> Self {
        let (phase, position) = parse_dfen(map(), dfen).unwrap();
        Case {
            turn: TurnState::new(phase, position),
            previous: None,
            rules: RuleOptions::default(),
        }
    }

    /// A movement phase with the given units and no owned centers.
    fn spring(units: &str) -> Self {
        Self::new(&format!("1901sm/{units}/-/-"))
    }

    fn option(mut self, key: &str, value: &str) -> Self {
        self.rules.set_option_value(key, value).unwrap();
        self
    }

    fn orders(mut self, power: &str, dson: &str) -> Self {
        let power_id = map().power(power).unwrap();
        for order in parse_orders(map(), dson, self.turn.phase().kind).unwrap() {
            self.turn.add_order(power_id, order).unwrap();
        }
        self
    }

    fn run(mut self) -> Outcome {
        let adjudication =
            adjudicate(map(), &self.rules, &mut self.turn, self.previous.as_ref()).unwrap();
        Outcome {
            turn: self.turn,
            adjudication,
            rules: self.rules,
        }
    }
}

struct Outcome {
    turn: TurnState,
    adjudication: Adjudication,
    rules: RuleOptions,
}

impl Outcome {
    /// The adjudicated result of the order for the unit in `abbr`.
    fn result(&self, abbr: &str) -> &OrderResult {
        let prov = p(abbr);
        self.turn
            .results()
            .iter()
            .filter(|r| r.order.as_ref().and_then(|o| o.source()) == Some(prov))
            .map(|r| &r.result)
            .find(|r| {
                matches!(
                    r,
                    OrderResult::Succeeded
                        | OrderResult::Failed
                        | OrderResult::Bounced { .. }
                        | OrderResult::Cut { .. }
                )
            })
            .unwrap_or_else(|| panic!("no result for {abbr}: {:#?}", self.turn.results()))
    }

    fn succeeds(&self, abbr: &str) -> bool {
        *self.result(abbr) == OrderResult::Succeeded
    }

    fn invalid(&self, abbr: &str) -> bool {
        let prov = p(abbr);
        self.turn.results().iter().any(|r| {
            matches!(r.result, OrderResult::Invalid { .. })
                && r.order.as_ref().and_then(|o| o.source()) == Some(prov)
        })
    }

    fn dislodged(&self, abbr: &str) -> bool {
        self.adjudication.position.dislodged(p(abbr)).is_some()
    }

    fn unit(&self, abbr: &str) -> Option<Unit> {
        self.adjudication.position.unit(p(abbr)).copied()
    }

    fn power_at(&self, abbr: &str) -> Option<&str> {
        self.unit(abbr).map(|u| map().power_name(u.power))
    }

    /// The following turn, with this one as its predecessor.
    fn next(self) -> Case {
        Case {
            turn: self.adjudication.next.expect("game ended"),
            previous: Some(self.turn),
            rules: self.rules,
        }
    }
}

// ===========================================================================
// SECTION 6.A: BASIC CHECKS
// ===========================================================================

/// 6.A.1: Moving to an area that is not a neighbour.
#[test]
fn datc_6a1_move_to_non_adjacent_area() {
    let out = Case::spring("Efnth").orders("England", "F nth - pic").run();
    assert!(out.invalid("nth"));
    assert!(out.succeeds("nth"));
    assert_eq!(out.power_at("nth"), Some("England"));
}

/// 6.A.2: Move army to sea.
#[test]
fn datc_6a2_move_army_to_sea() {
    let out = Case::spring("Ealvp").orders("England", "A lvp - iri").run();
    assert!(out.invalid("lvp"));
    assert!(out.unit("lvp").is_some());
}

/// 6.A.3: Move fleet to land.
#[test]
fn datc_6a3_move_fleet_to_land() {
    let out = Case::spring("Gfkie").orders("Germany", "F kie - mun").run();
    assert!(out.invalid("kie"));
    assert!(out.unit("mun").is_none());
}

/// 6.A.4: Move to own sector.
#[test]
fn datc_6a4_move_to_own_sector() {
    let out = Case::spring("Gfkie").orders("Germany", "F kie - kie").run();
    assert!(out.invalid("kie"));
    assert!(out.succeeds("kie"));
}

/// 6.A.6: Ordering a unit of another country.
#[test]
fn datc_6a6_ordering_a_unit_of_another_country() {
    let out = Case::spring("Eflon").orders("Germany", "F lon - nth").run();
    assert!(out.invalid("lon"));
    assert_eq!(out.power_at("lon"), Some("England"));
    assert!(out.unit("nth").is_none());
}

/// 6.A.7: Only armies can be convoyed.
#[test]
fn datc_6a7_only_armies_can_be_convoyed() {
    let out = Case::spring("Eflon,Efnth")
        .orders("England", "F lon - bel ; F nth C A lon - bel")
        .run();
    assert!(out.invalid("lon"));
    assert!(out.invalid("nth"));
    assert!(out.unit("bel").is_none());
}

/// 6.A.8: Support to hold yourself is not possible.
#[test]
fn datc_6a8_support_to_hold_yourself() {
    let out = Case::spring("Iaven,Iatyr,Aftri")
        .orders("Italy", "A ven - tri ; A tyr S A ven - tri")
        .orders("Austria", "F tri S F tri H")
        .run();
    assert!(out.invalid("tri"));
    assert!(out.succeeds("ven"));
    assert!(out.dislodged("tri"));
}

/// 6.A.9: Fleets must follow the coast.
#[test]
fn datc_6a9_fleets_must_follow_coast() {
    let out = Case::spring("Ifrom").orders("Italy", "F rom - ven").run();
    assert!(out.invalid("rom"));
    assert!(out.unit("ven").is_none());
}

/// 6.A.10: Support on unreachable destination not possible.
#[test]
fn datc_6a10_support_on_unreachable_destination() {
    let out = Case::spring("Aaven,Ifrom,Iaapu")
        .orders("Austria", "A ven H")
        .orders("Italy", "F rom S A apu - ven ; A apu - ven")
        .run();
    assert!(out.invalid("rom"));
    assert!(!out.succeeds("apu"));
    assert!(!out.dislodged("ven"));
}

/// 6.A.11: Simple bounce.
#[test]
fn datc_6a11_simple_bounce() {
    let out = Case::spring("Aavie,Iaven")
        .orders("Austria", "A vie - tyr")
        .orders("Italy", "A ven - tyr")
        .run();
    assert_eq!(*out.result("vie"), OrderResult::Bounced { against: p("ven") });
    assert_eq!(*out.result("ven"), OrderResult::Bounced { against: p("vie") });
    assert!(out.unit("tyr").is_none());
}

/// 6.A.12: Bounce of three units.
#[test]
fn datc_6a12_bounce_of_three_units() {
    let out = Case::spring("Aavie,Gamun,Iaven")
        .orders("Austria", "A vie - tyr")
        .orders("Germany", "A mun - tyr")
        .orders("Italy", "A ven - tyr")
        .run();
    assert!(!out.succeeds("vie"));
    assert!(!out.succeeds("mun"));
    assert!(!out.succeeds("ven"));
    assert!(out.unit("tyr").is_none());
}

/// Unit type given in the order does not match the unit.
#[test]
fn wrong_unit_type_is_invalid() {
    let out = Case::spring("Aavie").orders("Austria", "F vie - gal").run();
    assert!(out.invalid("vie"));
    assert!(out.unit("gal").is_none());
}

// ===========================================================================
// SECTION 6.B: COASTAL ISSUES
// ===========================================================================

/// 6.B.1: Moving with unspecified coast when coast is necessary.
#[test]
fn datc_6b1_unspecified_coast_when_necessary() {
    let out = Case::spring("Ffpor").orders("France", "F por - spa").run();
    assert!(out.invalid("por"));
    assert!(out.unit("spa").is_none());
}

/// 6.B.2: Moving with unspecified coast when coast is not necessary.
#[test]
fn datc_6b2_unspecified_coast_when_not_necessary() {
    let out = Case::spring("Ffgas").orders("France", "F gas - spa").run();
    assert!(out.succeeds("gas"));
    assert_eq!(
        out.unit("spa"),
        Some(Unit::with_coast(
            UnitType::Fleet,
            map().power("France").unwrap(),
            Coast::North
        ))
    );
}

/// 6.B.3: Moving with wrong coast when coast is not necessary.
#[test]
fn datc_6b3_wrong_coast() {
    let out = Case::spring("Ffgas").orders("France", "F gas - spa/sc").run();
    assert!(out.invalid("gas"));
    assert!(out.unit("spa").is_none());
}

/// 6.B.4: Support to unreachable coast allowed.
#[test]
fn datc_6b4_support_to_unreachable_coast_allowed() {
    let out = Case::spring("Ffgas,Ffmar,Ifwes")
        .orders("France", "F gas - spa/nc ; F mar S F gas - spa")
        .orders("Italy", "F wes - spa/sc")
        .run();
    assert!(out.succeeds("mar"));
    assert!(out.succeeds("gas"));
    assert!(!out.succeeds("wes"));
    assert_eq!(out.power_at("spa"), Some("France"));
}

/// 6.B.5: Support from unreachable coast not allowed.
#[test]
fn datc_6b5_support_from_unreachable_coast() {
    let out = Case::spring("Ffmar,Ffspa.nc,Ifgol")
        .orders("France", "F mar - gol ; F spa/nc S F mar - gol")
        .orders("Italy", "F gol H")
        .run();
    assert!(out.invalid("spa"));
    assert!(!out.succeeds("mar"));
    assert!(!out.dislodged("gol"));
}

/// 6.B.6: Support can be cut with other coast.
#[test]
fn datc_6b6_support_cut_from_other_coast() {
    let out = Case::spring("Efiri,Efnao,Ffspa.nc,Ffmao,Ifgol")
        .orders("England", "F iri S F nao - mao ; F nao - mao")
        .orders("France", "F spa/nc S F mao H ; F mao H")
        .orders("Italy", "F gol - spa/sc")
        .run();
    assert_eq!(*out.result("spa"), OrderResult::Cut { by: p("gol") });
    assert!(out.succeeds("nao"));
    assert!(out.dislodged("mao"));
}

/// 6.B.13: Coastal crawl not allowed.
#[test]
fn datc_6b13_coastal_crawl_not_allowed() {
    let out = Case::spring("Tfbul.sc,Tfcon")
        .orders("Turkey", "F bul/sc - con ; F con - bul/ec")
        .run();
    assert!(!out.succeeds("bul"));
    assert!(!out.succeeds("con"));
    assert_eq!(out.unit("bul").map(|u| u.coast), Some(Coast::South));
}

// ===========================================================================
// SECTION 6.C: CIRCULAR MOVEMENT
// ===========================================================================

/// 6.C.1: Three army circular movement.
#[test]
fn datc_6c1_three_army_circular_movement() {
    let out = Case::spring("Tfank,Tacon,Tasmy")
        .orders("Turkey", "F ank - con ; A con - smy ; A smy - ank")
        .run();
    assert!(out.succeeds("ank"));
    assert!(out.succeeds("con"));
    assert!(out.succeeds("smy"));
    assert_eq!(out.unit("con").map(|u| u.unit_type), Some(UnitType::Fleet));
    assert_eq!(out.unit("ank").map(|u| u.unit_type), Some(UnitType::Army));
    assert!(!out.adjudication.unresolved_paradox);
}

/// 6.C.2: Three army circular movement with support.
#[test]
fn datc_6c2_circular_movement_with_support() {
    let out = Case::spring("Tfank,Tacon,Tasmy,Tabul")
        .orders("Turkey", "F ank - con ; A con - smy ; A smy - ank ; A bul S F ank - con")
        .run();
    assert!(out.succeeds("ank"));
    assert!(out.succeeds("con"));
    assert!(out.succeeds("smy"));
}

/// 6.C.3: A disrupted three army circular movement.
#[test]
fn datc_6c3_disrupted_circular_movement() {
    let out = Case::spring("Tfank,Tacon,Tasmy,Tabul")
        .orders("Turkey", "F ank - con ; A con - smy ; A smy - ank ; A bul - con")
        .run();
    assert!(!out.succeeds("ank"));
    assert!(!out.succeeds("con"));
    assert!(!out.succeeds("smy"));
    assert!(!out.succeeds("bul"));
}

/// 6.C.6: Two armies with two convoys.
#[test]
fn datc_6c6_two_armies_with_two_convoys() {
    let out = Case::spring("Efnth,Ealon,Ffeng,Fabel")
        .orders("England", "F nth C A lon - bel ; A lon - bel")
        .orders("France", "F eng C A bel - lon ; A bel - lon")
        .run();
    assert!(out.succeeds("lon"));
    assert!(out.succeeds("bel"));
    assert_eq!(out.power_at("bel"), Some("England"));
    assert_eq!(out.power_at("lon"), Some("France"));
}

/// 6.C.7: Disrupted unit swap.
#[test]
fn datc_6c7_disrupted_unit_swap() {
    let out = Case::spring("Efnth,Ealon,Ffeng,Fabel,Fabur")
        .orders("England", "F nth C A lon - bel ; A lon - bel")
        .orders("France", "F eng C A bel - lon ; A bel - lon ; A bur - bel")
        .run();
    assert!(!out.succeeds("lon"));
    assert!(!out.succeeds("bel"));
    assert!(!out.succeeds("bur"));
}

// ===========================================================================
// SECTION 6.D: SUPPORTS AND DISLODGES
// ===========================================================================

/// 6.D.1: Supported hold can prevent dislodgement.
#[test]
fn datc_6d1_supported_hold_prevents_dislodgement() {
    let out = Case::spring("Afadr,Aatri,Iaven,Iatyr")
        .orders("Austria", "F adr S A tri - ven ; A tri - ven")
        .orders("Italy", "A ven H ; A tyr S A ven H")
        .run();
    assert!(!out.succeeds("tri"));
    assert!(!out.dislodged("ven"));
}

/// 6.D.2: A move cuts support on hold.
#[test]
fn datc_6d2_move_cuts_support_on_hold() {
    let out = Case::spring("Afadr,Aatri,Aavie,Iaven,Iatyr")
        .orders("Austria", "F adr S A tri - ven ; A tri - ven ; A vie - tyr")
        .orders("Italy", "A ven H ; A tyr S A ven H")
        .run();
    assert_eq!(*out.result("tyr"), OrderResult::Cut { by: p("vie") });
    assert!(out.succeeds("tri"));
    assert!(out.dislodged("ven"));
}

/// 6.D.3: A move cuts support on move.
#[test]
fn datc_6d3_move_cuts_support_on_move() {
    let out = Case::spring("Afadr,Aatri,Iaven,Ifion")
        .orders("Austria", "F adr S A tri - ven ; A tri - ven")
        .orders("Italy", "A ven H ; F ion - adr")
        .run();
    assert!(!out.succeeds("adr"));
    assert!(!out.succeeds("tri"));
    assert!(!out.dislodged("ven"));
}

/// 6.D.4: Support to hold on unit supporting a hold allowed.
#[test]
fn datc_6d4_support_hold_on_supporting_unit() {
    let out = Case::spring("Gaber,Gfkie,Rfbal,Rapru")
        .orders("Germany", "A ber S F kie H ; F kie S A ber H")
        .orders("Russia", "F bal S A pru - ber ; A pru - ber")
        .run();
    assert!(!out.succeeds("pru"));
    assert!(!out.dislodged("ber"));
}

/// 6.D.15: Defender cannot cut support for attack on itself.
#[test]
fn datc_6d15_defender_cannot_cut_support_on_itself() {
    let out = Case::spring("Rfcon,Rfbla,Tfank")
        .orders("Russia", "F con S F bla - ank ; F bla - ank")
        .orders("Turkey", "F ank - con")
        .run();
    assert!(out.succeeds("con"));
    assert!(out.succeeds("bla"));
    assert!(out.dislodged("ank"));
}

/// 6.D.34: Support targeting own area not allowed.
#[test]
fn datc_6d34_support_targeting_own_area() {
    let out = Case::spring("Gaber,Gasil,Gfbal,Iapru,Rawar,Ralvn")
        .orders("Germany", "A ber - pru ; A sil S A ber - pru ; F bal S A ber - pru")
        .orders("Italy", "A pru S A lvn - pru")
        .orders("Russia", "A war S A lvn - pru ; A lvn - pru")
        .run();
    assert!(out.invalid("pru"));
    assert!(out.succeeds("ber"));
    assert!(!out.succeeds("lvn"));
    assert!(out.dislodged("pru"));
}

// ===========================================================================
// SECTION 6.E: HEAD-TO-HEAD BATTLES AND BELEAGUERED GARRISON
// ===========================================================================

/// 6.E.1: Dislodged unit has no effect on attacker's area.
#[test]
fn datc_6e1_dislodged_unit_has_no_effect_on_attackers_area() {
    let out = Case::spring("Gaber,Gfkie,Gasil,Rapru")
        .orders("Germany", "A ber - pru ; F kie - ber ; A sil S A ber - pru")
        .orders("Russia", "A pru - ber")
        .run();
    assert!(out.succeeds("ber"));
    assert!(out.succeeds("kie"));
    assert!(!out.succeeds("pru"));
    assert!(out.dislodged("pru"));
}

/// 6.E.2: No self dislodgement in head-to-head battle.
#[test]
fn datc_6e2_no_self_dislodgement_head_to_head() {
    let out = Case::spring("Gaber,Gfkie,Gamun")
        .orders("Germany", "A ber - kie ; F kie - ber ; A mun S A ber - kie")
        .run();
    assert!(!out.succeeds("ber"));
    assert!(!out.succeeds("kie"));
    assert!(!out.dislodged("kie"));
}

/// 6.E.7: No self dislodgement with beleaguered garrison.
#[test]
fn datc_6e7_no_self_dislodgement_with_beleaguered_garrison() {
    let out = Case::spring("Efnth,Efyor,Gfhol,Gfhel,Rfska,Rfnwy")
        .orders("England", "F nth H ; F yor S F nwy - nth")
        .orders("Germany", "F hol S F hel - nth ; F hel - nth")
        .orders("Russia", "F ska S F nwy - nth ; F nwy - nth")
        .run();
    assert!(!out.succeeds("hel"));
    assert!(!out.succeeds("nwy"));
    assert!(!out.dislodged("nth"));
}

// ===========================================================================
// SECTION 6.F: CONVOYS
// ===========================================================================

/// 6.F.1: No convoys in coastal areas.
#[test]
fn datc_6f1_no_convoy_in_coastal_areas() {
    let out = Case::spring("Tagre,Tfaeg,Tfcon,Tfbla")
        .orders(
            "Turkey",
            "A gre - sev ; F aeg C A gre - sev ; F con C A gre - sev ; F bla C A gre - sev",
        )
        .run();
    assert!(out.invalid("con"));
    assert!(out.unit("sev").is_none());
    assert!(out.unit("gre").is_some());
}

/// 6.F.2: An army being convoyed can bounce as normal.
#[test]
fn datc_6f2_convoyed_army_bounces() {
    let out = Case::spring("Efeng,Ealon,Fapar")
        .orders("England", "F eng C A lon - bre ; A lon - bre")
        .orders("France", "A par - bre")
        .run();
    assert!(!out.succeeds("lon"));
    assert!(!out.succeeds("par"));
    assert!(out.unit("bre").is_none());
}

/// 6.F.3: An army being convoyed can receive support.
#[test]
fn datc_6f3_convoyed_army_receives_support() {
    let out = Case::spring("Efeng,Ealon,Efmao,Fapar")
        .orders("England", "F eng C A lon - bre ; A lon - bre ; F mao S A lon - bre")
        .orders("France", "A par - bre")
        .run();
    assert!(out.succeeds("lon"));
    assert!(!out.succeeds("par"));
    assert_eq!(out.power_at("bre"), Some("England"));
}

/// 6.F.4: An attacked convoy is not disrupted.
#[test]
fn datc_6f4_attacked_convoy_not_disrupted() {
    let out = Case::spring("Efnth,Ealon,Gfska")
        .orders("England", "F nth C A lon - hol ; A lon - hol")
        .orders("Germany", "F ska - nth")
        .run();
    assert!(out.succeeds("lon"));
    assert!(!out.succeeds("ska"));
    assert_eq!(out.power_at("hol"), Some("England"));
}

/// 6.F.5: A beleaguered convoy is not disrupted.
#[test]
fn datc_6f5_beleaguered_convoy_not_disrupted() {
    let out = Case::spring("Efnth,Ealon,Ffeng,Ffbel,Gfska,Gfden")
        .orders("England", "F nth C A lon - hol ; A lon - hol")
        .orders("France", "F eng - nth ; F bel S F eng - nth")
        .orders("Germany", "F ska - nth ; F den S F ska - nth")
        .run();
    assert!(out.succeeds("lon"));
    assert!(!out.succeeds("eng"));
    assert!(!out.succeeds("ska"));
    assert!(!out.dislodged("nth"));
}

/// 6.F.6: Dislodged convoy does not cut support.
#[test]
fn datc_6f6_dislodged_convoy_does_not_cut_support() {
    let out = Case::spring("Efnth,Ealon,Gahol,Gabel,Gfhel,Gfska,Fapic,Fabur")
        .orders("England", "F nth C A lon - hol ; A lon - hol")
        .orders(
            "Germany",
            "A hol S A bel H ; A bel S A hol H ; F hel S F ska - nth ; F ska - nth",
        )
        .orders("France", "A pic - bel ; A bur S A pic - bel")
        .run();
    assert!(out.dislodged("nth"));
    assert!(!out.succeeds("lon"));
    assert!(out.succeeds("hol"));
    assert!(!out.succeeds("pic"));
    assert!(!out.dislodged("bel"));
}

/// 6.F.7: Dislodged convoy does not cause contested area.
#[test]
fn datc_6f7_dislodged_convoy_does_not_contest() {
    let out = Case::spring("Efnth,Ealon,Gfhel,Gfska")
        .orders("England", "F nth C A lon - hol ; A lon - hol")
        .orders("Germany", "F hel S F ska - nth ; F ska - nth")
        .run();
    assert!(out.dislodged("nth"));
    assert!(!out.succeeds("lon"));

    let out = out.next().orders("England", "F nth R hol").run();
    assert!(out.succeeds("nth"));
    assert_eq!(out.power_at("hol"), Some("England"));
}

/// 6.F.8: Dislodged convoy does not cause a bounce.
#[test]
fn datc_6f8_dislodged_convoy_does_not_bounce() {
    let out = Case::spring("Efnth,Ealon,Gfhel,Gfska,Gabel")
        .orders("England", "F nth C A lon - hol ; A lon - hol")
        .orders("Germany", "F hel S F ska - nth ; F ska - nth ; A bel - hol")
        .run();
    assert!(!out.succeeds("lon"));
    assert!(out.succeeds("bel"));
    assert_eq!(out.power_at("hol"), Some("Germany"));
}

/// 6.F.9: Dislodge of multi-route convoy.
#[test]
fn datc_6f9_dislodge_of_multi_route_convoy() {
    let out = Case::spring("Efeng,Efnth,Ealon,Ffbre,Ffmao")
        .orders("England", "F eng C A lon - bel ; F nth C A lon - bel ; A lon - bel")
        .orders("France", "F bre S F mao - eng ; F mao - eng")
        .run();
    assert!(out.dislodged("eng"));
    assert!(out.succeeds("lon"));
}

/// 6.F.10: Dislodge of multi-route convoy with foreign fleet.
#[test]
fn datc_6f10_multi_route_convoy_with_foreign_fleet() {
    let out = Case::spring("Efnth,Ealon,Gfeng,Ffbre,Ffmao")
        .orders("England", "F nth C A lon - bel ; A lon - bel")
        .orders("Germany", "F eng C A lon - bel")
        .orders("France", "F bre S F mao - eng ; F mao - eng")
        .run();
    assert!(out.dislodged("eng"));
    assert!(out.succeeds("lon"));
}

/// 6.F.14: Simple convoy paradox.
#[test]
fn datc_6f14_simple_convoy_paradox() {
    let out = Case::spring("Eflon,Efwal,Fabre,Ffeng")
        .orders("England", "F lon S F wal - eng ; F wal - eng")
        .orders("France", "A bre - lon ; F eng C A bre - lon")
        .run();
    assert!(out.succeeds("lon"));
    assert!(out.succeeds("wal"));
    assert!(out.dislodged("eng"));
    assert!(!out.succeeds("bre"));
}

/// 6.F.16: Pandin's paradox.
#[test]
fn datc_6f16_pandins_paradox() {
    let out = Case::spring("Eflon,Efwal,Fabre,Ffeng,Gfnth,Gfbel")
        .orders("England", "F lon S F wal - eng ; F wal - eng")
        .orders("France", "A bre - lon ; F eng C A bre - lon")
        .orders("Germany", "F nth S F bel - eng ; F bel - eng")
        .run();
    assert!(!out.succeeds("wal"));
    assert!(!out.succeeds("bel"));
    assert!(!out.succeeds("bre"));
    assert!(!out.dislodged("eng"));
    assert!(!out.dislodged("lon"));
}

/// A convoy that can only run through the fleet a support protects cannot
/// cut that support, but it can still dislodge the supporter.
#[test]
fn convoy_through_supported_fleet_dislodges_supporter() {
    let out = Case::spring("Eflon,Efwal,Fabre,Ffeng,Ffyor,Ffiri")
        .orders("England", "F lon S F wal - eng ; F wal - eng")
        .orders(
            "France",
            "A bre - lon ; F eng C A bre - lon ; F yor S A bre - lon ; F iri S F eng H",
        )
        .run();
    assert!(out.succeeds("bre"));
    assert!(out.dislodged("lon"));
    assert!(!out.succeeds("lon"));
    assert!(!out.succeeds("wal"));
    assert!(!out.dislodged("eng"));
    let lon = p("lon");
    let verdicts = out
        .turn
        .results()
        .iter()
        .filter(|r| r.order.as_ref().and_then(|o| o.source()) == Some(lon))
        .filter(|r| r.result == OrderResult::Succeeded)
        .count();
    assert_eq!(verdicts, 0);
}

/// 6.F.17: Pandin's extended paradox.
#[test]
fn datc_6f17_pandins_extended_paradox() {
    let out = Case::spring("Eflon,Efwal,Fabre,Ffeng,Ffyor,Gfnth,Gfbel")
        .orders("England", "F lon S F wal - eng ; F wal - eng")
        .orders("France", "A bre - lon ; F eng C A bre - lon ; F yor S A bre - lon")
        .orders("Germany", "F nth S F bel - eng ; F bel - eng")
        .run();
    assert!(!out.adjudication.unresolved_paradox);
    assert!(!out.succeeds("bre"));
    assert!(!out.succeeds("wal"));
    assert!(!out.succeeds("bel"));
    assert!(out.succeeds("lon"));
    assert!(!out.dislodged("eng"));
    assert!(!out.dislodged("lon"));
}

/// 6.F.22: Second order paradox with two resolutions.
#[test]
fn datc_6f22_second_order_paradox_with_two_resolutions() {
    let out = Case::spring("Efedi,Eflon,Fabre,Ffeng,Gfbel,Gfpic,Ranwy,Rfnth")
        .orders("England", "F edi - nth ; F lon S F edi - nth")
        .orders("France", "A bre - lon ; F eng C A bre - lon")
        .orders("Germany", "F bel S F pic - eng ; F pic - eng")
        .orders("Russia", "A nwy - bel ; F nth C A nwy - bel")
        .run();
    assert!(!out.adjudication.unresolved_paradox);
    assert!(out.succeeds("lon"));
    assert!(out.succeeds("bel"));
    assert!(out.succeeds("edi"));
    assert!(out.succeeds("pic"));
    assert!(out.dislodged("nth"));
    assert!(out.dislodged("eng"));
    assert!(!out.succeeds("bre"));
    assert!(!out.succeeds("nwy"));
}

/// 6.F.23: Second order paradox with two exclusive convoys.
#[test]
fn datc_6f23_second_order_paradox_with_exclusive_convoys() {
    let out = Case::spring("Efedi,Efyor,Fabre,Ffeng,Gfbel,Gflon,Ifmao,Ifiri,Ranwy,Rfnth")
        .orders("England", "F edi - nth ; F yor S F edi - nth")
        .orders("France", "A bre - lon ; F eng C A bre - lon")
        .orders("Germany", "F bel S F eng H ; F lon S F nth H")
        .orders("Italy", "F mao - eng ; F iri S F mao - eng")
        .orders("Russia", "A nwy - bel ; F nth C A nwy - bel")
        .run();
    assert!(!out.adjudication.unresolved_paradox);
    assert!(!out.succeeds("edi"));
    assert!(!out.succeeds("mao"));
    assert!(!out.succeeds("bre"));
    assert!(!out.succeeds("nwy"));
    assert!(!out.dislodged("nth"));
    assert!(!out.dislodged("eng"));
}

/// 6.F.24: Second order paradox with no resolution.
#[test]
fn datc_6f24_second_order_paradox_with_no_resolution() {
    let out = Case::spring("Efedi,Eflon,Efiri,Efmao,Fabre,Ffeng,Ffbel,Ranwy,Rfnth")
        .orders("England", "F edi - nth ; F lon S F edi - nth ; F iri - eng ; F mao S F iri - eng")
        .orders("France", "A bre - lon ; F eng C A bre - lon ; F bel S F eng H")
        .orders("Russia", "A nwy - bel ; F nth C A nwy - bel")
        .run();
    assert!(!out.adjudication.unresolved_paradox);
    assert!(out.succeeds("edi"));
    assert!(out.dislodged("nth"));
    assert!(!out.succeeds("iri"));
    assert!(!out.dislodged("eng"));
    assert!(!out.succeeds("bre"));
    assert!(!out.succeeds("nwy"));
}

/// 6.F.18: Betrayal paradox, settled by failing the convoyed move.
#[test]
fn datc_6f18_betrayal_paradox() {
    let out = Case::spring("Efnth,Ealon,Efeng,Ffbel,Gfhel,Gfska")
        .orders("England", "F nth C A lon - bel ; A lon - bel ; F eng S A lon - bel")
        .orders("France", "F bel S F nth H")
        .orders("Germany", "F hel S F ska - nth ; F ska - nth")
        .run();
    assert!(!out.succeeds("lon"));
    assert!(!out.succeeds("ska"));
    assert!(!out.dislodged("nth"));
    assert!(!out.dislodged("bel"));
}

// ===========================================================================
// SECTION 6.G: CONVOYING TO ADJACENT PLACES
// ===========================================================================

/// 6.G.1: Two units can swap places by convoy.
#[test]
fn datc_6g1_swap_by_convoy() {
    let out = Case::spring("Eanwy,Efska,Raswe")
        .orders("England", "A nwy - swe ; F ska C A nwy - swe")
        .orders("Russia", "A swe - nwy")
        .run();
    assert!(out.succeeds("nwy"));
    assert!(out.succeeds("swe"));
    assert_eq!(out.power_at("swe"), Some("England"));
    assert_eq!(out.power_at("nwy"), Some("Russia"));
}

/// Without a convoy order the same swap is a head-to-head bounce.
#[test]
fn adjacent_swap_without_convoy_bounces() {
    let out = Case::spring("Eanwy,Raswe")
        .orders("England", "A nwy - swe")
        .orders("Russia", "A swe - nwy")
        .run();
    assert!(!out.succeeds("nwy"));
    assert!(!out.succeeds("swe"));
}

// ===========================================================================
// CONVOY ROUTE OPTIONS
// ===========================================================================

#[test]
fn explicit_routes_require_a_named_route() {
    let out = Case::spring("Efnth,Ealon")
        .option("convoy_routes", "explicit")
        .orders("England", "F nth C A lon - bel ; A lon - bel")
        .run();
    assert!(out.invalid("lon"));
    assert!(out.unit("bel").is_none());
}

#[test]
fn explicit_route_is_followed() {
    let out = Case::spring("Efnth,Ealon")
        .option("convoy_routes", "explicit")
        .orders("England", "F nth C A lon - bel ; A lon - bel via nth")
        .run();
    assert!(out.succeeds("lon"));
    assert_eq!(out.power_at("bel"), Some("England"));
}

#[test]
fn named_route_fails_when_its_fleet_is_dislodged() {
    let out = Case::spring("Efeng,Efnth,Ealon,Ffbre,Ffmao")
        .option("convoy_routes", "either")
        .orders("England", "F eng C A lon - bel ; F nth C A lon - bel ; A lon - bel via eng")
        .orders("France", "F bre S F mao - eng ; F mao - eng")
        .run();
    assert!(out.dislodged("eng"));
    assert!(!out.succeeds("lon"));
}

// ===========================================================================
// SECTION 6.H: RETREATING
// ===========================================================================

/// 6.H.9: Two retreats to the same province both fail.
#[test]
fn datc_6h_retreat_standoff_disbands_both() {
    let out = Case::new("1901sr/Taser,Tagre/-/Aaser<bul,Iagre<bul")
        .orders("Austria", "A ser R alb")
        .orders("Italy", "A gre R alb")
        .run();
    assert!(!out.succeeds("ser"));
    assert!(!out.succeeds("gre"));
    assert!(out.unit("alb").is_none());
    assert!(!out.adjudication.position.has_dislodged());
}

/// A unit cannot retreat to the area its attacker came from.
#[test]
fn datc_6h_retreat_to_attacker_origin_is_invalid() {
    let out = Case::new("1901sr/Taser/-/Aaser<bul")
        .orders("Austria", "A ser R bul")
        .run();
    assert!(out.invalid("ser"));
    assert!(out.unit("bul").is_none());
    assert_eq!(out.power_at("ser"), Some("Turkey"));
}

/// A dislodged unit without orders is disbanded.
#[test]
fn unordered_dislodged_unit_is_disbanded() {
    let out = Case::new("1901sr/Taser/-/Aaser<bul").run();
    assert_eq!(out.adjudication.position.units().count(), 1);
    assert!(!out.adjudication.position.has_dislodged());
}

/// A retreat may not go to an area left vacant by a standoff.
#[test]
fn retreat_into_standoff_area_is_invalid() {
    let out = Case::spring("Aaser,Aftri,Tabul,Tarum,Ifion")
        .orders("Turkey", "A bul - ser ; A rum S A bul - ser")
        .orders("Austria", "A ser H ; F tri - alb")
        .orders("Italy", "F ion - alb")
        .run();
    assert!(out.dislodged("ser"));
    assert!(out.unit("alb").is_none());

    let out = out.next().orders("Austria", "A ser R alb").run();
    assert!(out.invalid("ser"));
    assert!(out.unit("alb").is_none());
    assert_eq!(out.power_at("ser"), Some("Turkey"));
}

/// A dislodged unit may retreat to any other free neighbour.
#[test]
fn retreat_after_dislodgement() {
    let out = Case::spring("Aaser,Tabul,Tarum")
        .orders("Turkey", "A bul - ser ; A rum S A bul - ser")
        .run();
    assert!(out.dislodged("ser"));

    let out = out.next().orders("Austria", "A ser R gre").run();
    assert!(out.succeeds("ser"));
    assert_eq!(out.power_at("gre"), Some("Austria"));
}

// ===========================================================================
// SECTION 6.I: BUILDING
// ===========================================================================

#[test]
fn builds_in_home_centers() {
    let out = Case::new("1901fb/Aavie/Abud,Atri,Avie,Aser/-")
        .orders("Austria", "A bud B ; F tri B")
        .run();
    assert!(out.succeeds("bud"));
    assert!(out.succeeds("tri"));
    assert_eq!(out.unit("tri").map(|u| u.unit_type), Some(UnitType::Fleet));
    assert!(out
        .turn
        .results()
        .iter()
        .any(|r| r.message == "Austria: 1 unused build(s) forfeited"));
}

/// Building outside home centers is invalid under the standard rule.
#[test]
fn build_in_non_home_center_is_invalid() {
    let out = Case::new("1901fb/Aavie/Abud,Atri,Avie,Aser/-")
        .orders("Austria", "A ser B")
        .run();
    assert!(out.invalid("ser"));
    assert!(out.unit("ser").is_none());
}

#[test]
fn build_in_any_owned_center_when_allowed() {
    let out = Case::new("1901fb/Aavie/Abud,Atri,Avie,Aser/-")
        .option("builds", "any-owned")
        .orders("Austria", "A ser B")
        .run();
    assert!(out.succeeds("ser"));
    assert_eq!(out.power_at("ser"), Some("Austria"));
}

/// Builds beyond the allowance fail.
#[test]
fn builds_beyond_the_allowance_fail() {
    let out = Case::new("1901fb/Aavie,Aaser/Abud,Atri,Avie/-")
        .orders("Austria", "F tri B ; A bud B")
        .run();
    let built = ["bud", "tri"].iter().filter(|a| out.succeeds(a)).count();
    assert_eq!(built, 1);
    assert_eq!(out.adjudication.position.units().count(), 3);
}

/// An occupied center cannot take a build.
#[test]
fn build_in_occupied_center_is_invalid() {
    let out = Case::new("1901fb/Aavie/Abud,Atri,Avie/-")
        .orders("Austria", "A vie B")
        .run();
    assert!(out.invalid("vie"));
}

#[test]
fn missing_removals_are_chosen_by_distance() {
    let out = Case::new("1901fb/Aavie,Aaukr,Afalb/Avie/-").run();
    assert!(out.succeeds("ukr"));
    assert!(out.succeeds("alb"));
    assert!(out.unit("ukr").is_none());
    assert!(out.unit("alb").is_none());
    assert_eq!(out.power_at("vie"), Some("Austria"));
}

#[test]
fn ordered_removal_is_respected() {
    let out = Case::new("1901fb/Aavie,Aaukr,Afalb/Avie,Atri/-")
        .orders("Austria", "A vie D")
        .run();
    assert!(out.succeeds("vie"));
    assert!(out.unit("vie").is_none());
    assert!(out.unit("ukr").is_some());
    assert!(out.unit("alb").is_some());
}
