// SPDX-License-Identifier: BSD-3-Clause
// To debug or develop a test, try `eprintln!("{:#?}", rules)`

use std::collections::HashSet;

use ptrules::{
    program::{Callee, ValueKind},
    program_rules, CallMaps, Error, Models, Rule, RuleKind, SignatureIndex, Translator,
};

mod common;

use common::{call, flat, ret, Loc, Mock};

use RuleKind::*;

fn rules_of(m: &Mock, v: Loc) -> Result<Vec<Rule<Loc>>, Error> {
    let models = Models::libc();
    let index = CallMaps::build(m, &models);
    Translator::new(m, &models, &index).rules(&v)
}

fn flat_rules_of(m: &Mock, v: Loc) -> Vec<(RuleKind, Loc, Option<Loc>)> {
    flat(&rules_of(m, v).unwrap())
}

// ------------------------------------------------------------------
// Single instructions

#[test]
fn load_from_slot_and_register() {
    let mut m = Mock::default();
    m.alloca("slot")
        .global("g", None)
        .constant_expr("gep(g)", "g")
        .value("x", ValueKind::Load { pointer: "slot" })
        .value("y", ValueKind::Load { pointer: "p" })
        .value("z", ValueKind::Load { pointer: "gep(g)" });
    assert_eq!(vec![(VarAsgnVar, "x", Some("slot"))], flat_rules_of(&m, "x"));
    assert_eq!(vec![(VarAsgnDrefVar, "y", Some("p"))], flat_rules_of(&m, "y"));
    assert_eq!(vec![(VarAsgnVar, "z", Some("g"))], flat_rules_of(&m, "z"));
}

#[test]
fn store_cases() {
    let mut m = Mock::default();
    m.alloca("slot").alloca("a").null("null");
    let cases = [
        ("s1", "a", "q", (DrefVarAsgnRefVar, "q", Some("a"))),
        ("s2", "null", "q", (DrefVarAsgnNull, "q", Some("null"))),
        ("s3", "v", "q", (DrefVarAsgnVar, "q", Some("v"))),
        ("s4", "a", "slot", (VarAsgnRefVar, "slot", Some("a"))),
        ("s5", "null", "slot", (VarAsgnNull, "slot", Some("null"))),
        ("s6", "v", "slot", (VarAsgnVar, "slot", Some("v"))),
    ];
    for (s, value, pointer, _) in cases {
        m.value(s, ValueKind::Store { value, pointer });
    }
    for (s, _, _, expected) in cases {
        assert_eq!(vec![expected], flat_rules_of(&m, s), "{}", s);
    }
}

#[test]
fn store_null_through_register() {
    // store i32* null, i32** %q
    let mut m = Mock::default();
    m.null("null").value(
        "s",
        ValueKind::Store {
            value: "null",
            pointer: "q",
        },
    );
    let rules = rules_of(&m, "s").unwrap();
    assert_eq!(vec![(DrefVarAsgnNull, "q", Some("null"))], flat(&rules));
    assert_eq!("*q = NULL@null", rules[0].to_string());
}

#[test]
fn store_strips_constant_expressions() {
    let mut m = Mock::default();
    m.global("g", None)
        .global("h", None)
        .constant_expr("bitcast(g)", "g")
        .constant_expr("gep(bitcast(h))", "bitcast(h)")
        .constant_expr("bitcast(h)", "h")
        .value(
            "s",
            ValueKind::Store {
                value: "bitcast(g)",
                pointer: "gep(bitcast(h))",
            },
        );
    assert_eq!(vec![(VarAsgnRefVar, "h", Some("g"))], flat_rules_of(&m, "s"));
}

#[test]
fn casts_take_addresses_of_slots() {
    let mut m = Mock::default();
    m.alloca("slot")
        .value("b", ValueKind::BitCast { operand: "slot" })
        .value("e", ValueKind::GetElementPtr { pointer: "p" });
    assert_eq!(vec![(VarAsgnRefVar, "b", Some("slot"))], flat_rules_of(&m, "b"));
    assert_eq!(vec![(VarAsgnVar, "e", Some("p"))], flat_rules_of(&m, "e"));
}

#[test]
fn phi_keeps_incoming_order() {
    let mut m = Mock::default();
    m.null("null").value(
        "x",
        ValueKind::Phi {
            incoming: vec!["null", "v2", "v3"],
        },
    );
    assert_eq!(
        vec![
            (VarAsgnNull, "x", Some("null")),
            (VarAsgnVar, "x", Some("v2")),
            (VarAsgnVar, "x", Some("v3")),
        ],
        flat_rules_of(&m, "x")
    );
}

#[test]
fn aggregates() {
    let mut m = Mock::default();
    m.alloca("slot")
        .alloca("a")
        .value("x", ValueKind::ExtractValue { aggregate: "agg" })
        .value("bad_x", ValueKind::ExtractValue { aggregate: "slot" })
        .value(
            "y",
            ValueKind::InsertValue {
                aggregate: "agg",
                value: "a",
            },
        )
        .value(
            "bad_y",
            ValueKind::InsertValue {
                aggregate: "slot",
                value: "a",
            },
        );
    assert_eq!(vec![(VarAsgnVar, "x", Some("agg"))], flat_rules_of(&m, "x"));
    assert_eq!(
        vec![(VarAsgnRefVar, "agg", Some("a"))],
        flat_rules_of(&m, "y")
    );
    assert_eq!(
        Err(Error::AggregateHasExtraReference),
        rules_of(&m, "bad_x")
    );
    assert_eq!(
        Err(Error::AggregateHasExtraReference),
        rules_of(&m, "bad_y")
    );
}

#[test]
fn int_to_ptr_points_to_unknown() {
    let mut m = Mock::default();
    m.value("p", ValueKind::IntToPtr)
        .value("q", ValueKind::IntToPtr);
    assert_eq!(vec![(VarAsgnRefVar, "p", Some("undef"))], flat_rules_of(&m, "p"));
    assert_eq!(vec![(VarAsgnRefVar, "q", Some("undef"))], flat_rules_of(&m, "q"));
}

#[test]
fn global_initializers() {
    // @g = global i32* @target
    let mut m = Mock::default();
    m.global("target", None).global("g", Some("target"));
    assert_eq!(
        vec![(VarAsgnRefVar, "g", Some("target"))],
        flat_rules_of(&m, "g")
    );
    assert_eq!(Vec::<(RuleKind, Loc, Option<Loc>)>::new(), flat_rules_of(&m, "target"));
}

#[test]
fn unmodeled_values_have_no_rules() {
    let m = Mock::default();
    assert!(rules_of(&m, "select").unwrap().is_empty());
}

// ------------------------------------------------------------------
// Calls and returns

#[test]
fn malloc_is_its_own_allocation_site() {
    // %p = call i8* @malloc(i64 16)
    let mut m = Mock::default();
    m.not_pointer("n")
        .not_pointer("16")
        .declare("malloc", &["n"], "i8*", "i8*(i64)")
        .value("p", call(Callee::Direct("malloc"), &["16"]));
    let rules = rules_of(&m, "p").unwrap();
    assert_eq!(vec![(VarAsgnAlloc, "p", Some("p"))], flat(&rules));
    assert_eq!("p = ALLOC@p", rules[0].to_string());
}

#[test]
fn free_deallocates_its_argument() {
    let mut m = Mock::default();
    m.declare("free", &["ptr"], "void", "void(i8*)")
        .constant_expr("bitcast(p)", "p")
        .value("c", call(Callee::Direct("free"), &["bitcast(p)"]));
    assert_eq!(vec![(Dealloc, "p", None)], flat_rules_of(&m, "c"));
}

#[test]
fn memcpy_copies_pointees() {
    let mut m = Mock::default();
    m.not_pointer("n")
        .declare(
            "llvm.memcpy.p0i8.p0i8.i64",
            &["d", "s", "len", "volatile"],
            "void",
            "void(i8*, i8*, i64, i1)",
        )
        .value(
            "c",
            call(
                Callee::Direct("llvm.memcpy.p0i8.p0i8.i64"),
                &["dst", "src", "n", "false"],
            ),
        );
    assert_eq!(
        vec![(DrefVarAsgnDrefVar, "dst", Some("src"))],
        flat_rules_of(&m, "c")
    );
}

#[test]
fn memmove_copies_pointees() {
    let mut m = Mock::default();
    m.not_pointer("n")
        .declare(
            "llvm.memmove.p0i8.p0i8.i64",
            &["d", "s", "len", "volatile"],
            "void",
            "void(i8*, i8*, i64, i1)",
        )
        .declare("memmove", &["d", "s", "len"], "i8*", "i8*(i8*, i8*, i64)")
        .value(
            "c1",
            call(
                Callee::Direct("llvm.memmove.p0i8.p0i8.i64"),
                &["dst", "src", "n", "false"],
            ),
        )
        .value("c2", call(Callee::Direct("memmove"), &["dst", "src", "n"]));
    for c in ["c1", "c2"] {
        assert_eq!(
            vec![(DrefVarAsgnDrefVar, "dst", Some("src"))],
            flat_rules_of(&m, c),
            "{}",
            c
        );
    }
}

#[test]
fn memory_calls_missing_arguments_emit_nothing() {
    let mut m = Mock::default();
    m.declare("free", &[], "void", "void()")
        .declare("memcpy", &["d"], "void", "void(i8*)")
        .value("c1", call(Callee::Direct("free"), &[]))
        .value("c2", call(Callee::Direct("memcpy"), &["dst"]));
    assert!(rules_of(&m, "c1").unwrap().is_empty());
    assert!(rules_of(&m, "c2").unwrap().is_empty());
}

#[test]
fn direct_call_passes_pointer_arguments() {
    let mut m = Mock::default();
    m.alloca("a")
        .not_pointer("fi")
        .not_pointer("i")
        .define("f", &["fp", "fi"], "void", "void(i8*, i32)", &[])
        .value("c", call(Callee::Direct("f"), &["a", "i"]));
    assert_eq!(
        vec![(VarAsgnRefVar, "fp", Some("a"))],
        flat_rules_of(&m, "c")
    );
}

#[test]
fn external_function_returns_unknown_memory() {
    let mut m = Mock::default();
    m.declare("getenv", &["name"], "i8*", "i8*(i8*)")
        .value("c", call(Callee::Direct("getenv"), &["str"]));
    assert_eq!(
        vec![
            (VarAsgnVar, "name", Some("str")),
            (VarAsgnRefVar, "c", Some("undef<i8>")),
        ],
        flat_rules_of(&m, "c")
    );
}

#[test]
fn indirect_call_fans_out_by_signature() {
    let mut m = Mock::default();
    m.define("f", &["fp"], "i8*", "i8*(i8*)", &[])
        .define("g", &["gp"], "i8*", "i8*(i8*)", &[])
        .define("h", &["hp"], "void", "void(i8*)", &[])
        .value("c", call(Callee::Indirect("i8*(i8*)"), &["a"]));
    assert_eq!(
        vec![(VarAsgnVar, "fp", Some("a")), (VarAsgnVar, "gp", Some("a"))],
        flat_rules_of(&m, "c")
    );
}

#[test]
fn inline_assembly_is_rejected() {
    let mut m = Mock::default();
    m.value("c", call(Callee::Asm, &["a"]));
    assert_eq!(Err(Error::InlineAssembly), rules_of(&m, "c"));
}

#[test]
fn returns_reach_direct_callers_and_indirect_call_sites() {
    let mut m = Mock::default();
    m.not_pointer("i")
        .define("f", &[], "i8*", "i8*()", &["r", "r_int", "r_void"])
        .define("g", &[], "i8*", "i8*()", &[])
        .define("main", &[], "void", "void()", &["c1", "c2", "c3"])
        .value("r", ret("f", Some("v")))
        .value("r_int", ret("f", Some("i")))
        .value("r_void", ret("f", None))
        .value("c1", call(Callee::Direct("f"), &[]))
        .value("c2", call(Callee::Direct("g"), &[]))
        .value("c3", call(Callee::Indirect("i8*()"), &[]));
    assert_eq!(
        vec![(VarAsgnVar, "c1", Some("v")), (VarAsgnVar, "c3", Some("v"))],
        flat_rules_of(&m, "r")
    );
    assert!(flat_rules_of(&m, "r_int").is_empty());
    assert!(flat_rules_of(&m, "r_void").is_empty());
}

#[test]
fn returned_addresses_and_nulls() {
    let mut m = Mock::default();
    m.global("g", None)
        .null("null")
        .define("f", &[], "i8*", "i8*()", &["r1", "r2"])
        .define("main", &[], "void", "void()", &["c"])
        .value("r1", ret("f", Some("g")))
        .value("r2", ret("f", Some("null")))
        .value("c", call(Callee::Direct("f"), &[]));
    assert_eq!(vec![(VarAsgnRefVar, "c", Some("g"))], flat_rules_of(&m, "r1"));
    assert_eq!(vec![(VarAsgnNull, "c", Some("null"))], flat_rules_of(&m, "r2"));
}

// ------------------------------------------------------------------
// Index, sinks and the whole-program driver

#[test]
fn call_maps() {
    let mut m = Mock::default();
    m.define("f", &[], "i8*", "i8*()", &["c1", "c2", "c3"])
        .define("malloc", &["n"], "i8*", "i8*(i64)", &[])
        .declare("ext", &[], "i8*", "i8*()")
        .value("c1", call(Callee::Direct("ext"), &[]))
        .value("c2", call(Callee::Indirect("i8*()"), &[]))
        .value("c3", call(Callee::Asm, &[]));
    let index = CallMaps::build(&m, &Models::libc());
    assert_eq!(&["f"], index.functions_with_signature(&"i8*()"));
    assert!(index.functions_with_signature(&"i8*(i64)").is_empty());
    assert_eq!(&["c1", "c2"], index.calls_with_signature(&"i8*()"));
}

#[test]
fn hash_set_sink_deduplicates() {
    let mut m = Mock::default();
    m.value(
        "x",
        ValueKind::Phi {
            incoming: vec!["v", "v", "w"],
        },
    );
    let models = Models::libc();
    let index = CallMaps::build(&m, &models);
    let mut sink: HashSet<Rule<Loc>> = HashSet::new();
    Translator::new(&m, &models, &index)
        .rules_of(&"x", &mut sink)
        .unwrap();
    assert_eq!(2, sink.len());
}

#[test]
fn failures_do_not_stop_extraction() {
    let mut m = Mock::default();
    m.alloca("slot")
        .global("target", None)
        .global("g", Some("target"))
        .declare("malloc", &["n"], "i8*", "i8*(i64)")
        .define("main", &[], "void", "void()", &["p", "asm", "s"])
        .value("p", call(Callee::Direct("malloc"), &["16"]))
        .value("asm", call(Callee::Asm, &["p"]))
        .value(
            "s",
            ValueKind::Store {
                value: "p",
                pointer: "slot",
            },
        );
    let models = Models::libc();
    let index = CallMaps::build(&m, &models);
    let out = program_rules(&m, &models, &index);
    assert_eq!(
        vec![
            (VarAsgnRefVar, "g", Some("target")),
            (VarAsgnAlloc, "p", Some("p")),
            (VarAsgnVar, "slot", Some("p")),
        ],
        flat(&out.rules)
    );
    assert_eq!(vec![("asm", Error::InlineAssembly)], out.failures);
}

#[test]
fn memory_management_definitions_are_not_call_targets() {
    let mut m = Mock::default();
    m.define("free", &["ptr"], "void", "void(i8*)", &[])
        .define("main", &[], "void", "void()", &["c"])
        .value("c", call(Callee::Indirect("void(i8*)"), &["a"]));
    let models = Models::libc();
    let index = CallMaps::build(&m, &models);
    let out = program_rules(&m, &models, &index);
    assert!(out.rules.is_empty());
    assert!(out.failures.is_empty());
}
