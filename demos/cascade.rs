//! Cascading deletion: an effect tears down its members as one unit,
//! and objects may die in any order without breaking cleanup.

use modgraph::{EffectGraph, ModifierKind, SumAggregate};

fn main() {
    let mut graph = EffectGraph::new();

    let hp = graph.add_stat("HP", Box::new(SumAggregate));
    let atk = graph.add_stat("ATK", Box::new(SumAggregate));

    let gear = graph.add_effect("gear");
    let helm = graph
        .add_modifier("helm", ModifierKind::Referenced, 15.0, Some(gear))
        .expect("create helm");
    let sword = graph
        .add_modifier("sword", ModifierKind::Referenced, 40.0, Some(gear))
        .expect("create sword");

    graph.attach(hp, helm).expect("attach helm");
    graph.attach(atk, sword).expect("attach sword");
    println!("HP = {}", graph.value(hp).expect("read HP")); // 15
    println!("ATK = {}", graph.value(atk).expect("read ATK")); // 40

    // Delete a stat first: its sources outlive it.
    graph.delete(atk).expect("delete ATK");
    println!("sword still live: {}", graph.contains(sword));

    // Unequip everything at once; members detach from live stats and
    // the modifier whose stat already died just goes quietly.
    graph.delete(gear).expect("delete gear");
    println!("HP = {}", graph.value(hp).expect("read HP")); // 0
    println!("helm deleted: {}", graph.is_deleted(helm).unwrap());
    println!("sword deleted: {}", graph.is_deleted(sword).unwrap());
    println!("live objects: {}", graph.live_count()); // 1 (just HP)
}
