// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Disassembly of compiled artifacts.

use super::bytecode::{Artifact, CompiledUnit, Instruction, Label, OperandIndex};
use std::fmt::Write;

const RULE: &str = "════════════════════════════════════════";

/// Renders every unit of an artifact, entry unit first.
pub fn disassemble(artifact: &Artifact) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== ARTIFACT ===\n");
    if let Some(entry) = artifact.entry_unit() {
        write_unit(&mut out, artifact, entry);
    }
    for (index, unit) in artifact.units.iter().enumerate() {
        if index != artifact.entry.index() {
            write_unit(&mut out, artifact, unit);
        }
    }
    out
}

/// Renders one unit.
pub fn disassemble_unit(artifact: &Artifact, unit: &CompiledUnit) -> String {
    let mut out = String::new();
    write_unit(&mut out, artifact, unit);
    out
}

fn write_unit(out: &mut String, artifact: &Artifact, unit: &CompiledUnit) {
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(
        out,
        " {}{}",
        unit.name,
        if unit.strict { " (strict)" } else { "" }
    );
    let _ = writeln!(
        out,
        " {} instructions, {} operands, {} temporaries",
        unit.instructions.len(),
        unit.operands.len(),
        unit.temp_count
    );
    let _ = writeln!(out, "{RULE}");

    for (ip, instruction) in unit.instructions.iter().enumerate() {
        let placed: Vec<String> = unit
            .labels
            .iter()
            .enumerate()
            .filter(|(_, offset)| **offset == ip)
            .map(|(label, _)| format!("L{label}"))
            .collect();
        if !placed.is_empty() {
            let _ = writeln!(out, "      ┌── {}", placed.join(" "));
        }
        let marker = if placed.is_empty() { "  " } else { "► " };
        let _ = writeln!(
            out,
            "{ip:04} {marker}{}",
            format_instruction(artifact, unit, instruction)
        );
    }
    let _ = writeln!(out);
}

fn operand(unit: &CompiledUnit, index: OperandIndex) -> String {
    unit.operand(index)
        .map(|operand| operand.to_string())
        .unwrap_or_else(|| format!("#{}?", index.index()))
}

fn target(unit: &CompiledUnit, label: Label) -> String {
    match unit.label_offset(label) {
        Some(offset) => format!("{label} -> {offset:04}"),
        None => format!("{label} -> ?"),
    }
}

fn format_instruction(artifact: &Artifact, unit: &CompiledUnit, instruction: &Instruction) -> String {
    match instruction {
        Instruction::Load(index) => format!("LOAD          {}", operand(unit, *index)),
        Instruction::Store { variable, strict } => format!(
            "STORE         {}{}",
            operand(unit, *variable),
            if *strict { " strict" } else { "" }
        ),
        Instruction::StoreTemp(temp) => format!("STORE_TEMP    %t{}", temp.index),
        Instruction::LoadThis => "LOAD_THIS".to_string(),
        Instruction::TypeOfVariable(index) => format!("TYPEOF_VAR    {}", operand(unit, *index)),
        Instruction::DeleteVariable(index) => format!("DELETE_VAR    {}", operand(unit, *index)),
        Instruction::DeclareVariable(index) => format!("DECLARE       {}", operand(unit, *index)),
        Instruction::InitializeBinding(index) => {
            format!("INIT_BINDING  {}", operand(unit, *index))
        }
        Instruction::MakeClosure(id) => {
            let name = artifact
                .function(*id)
                .and_then(|info| artifact.unit(info.unit))
                .map(|unit| unit.name.as_str())
                .unwrap_or("?");
            format!("MAKE_CLOSURE  #{} ({name})", id.index())
        }
        Instruction::Pop => "POP".to_string(),
        Instruction::Dup => "DUP".to_string(),
        Instruction::Dup2 => "DUP2".to_string(),
        Instruction::Swap => "SWAP".to_string(),
        Instruction::Nop => "NOP".to_string(),
        Instruction::Jump(label) => format!("JUMP          {}", target(unit, *label)),
        Instruction::JumpIfFalse(label) => format!("JUMP_IF_FALSE {}", target(unit, *label)),
        Instruction::JumpIfTrue(label) => format!("JUMP_IF_TRUE  {}", target(unit, *label)),
        Instruction::InvokeUnit(id) => format!(
            "INVOKE        {}",
            artifact.unit(*id).map(|unit| unit.name.as_str()).unwrap_or("?")
        ),
        Instruction::CallHelper(helper) => format!("HELPER        {helper}"),
        Instruction::EnterCatchScope(index) => {
            format!("ENTER_CATCH   {}", operand(unit, *index))
        }
        Instruction::ExitScope => "EXIT_SCOPE".to_string(),
        Instruction::ForInStep { keys, exhausted } => format!(
            "FOR_IN_STEP   %t{} {}",
            keys.index,
            target(unit, *exhausted)
        ),
        Instruction::NormalCompletion => "NORMAL".to_string(),
        Instruction::ValueCompletion => "NORMAL_VALUE".to_string(),
        Instruction::BreakCompletion(label) => {
            format!("BREAK         {}", label.as_deref().unwrap_or("-"))
        }
        Instruction::ContinueCompletion(label) => {
            format!("CONTINUE      {}", label.as_deref().unwrap_or("-"))
        }
        Instruction::ReturnCompletion => "RETURN".to_string(),
        Instruction::ThrowCompletion => "THROW".to_string(),
        Instruction::JumpIfAbrupt(label) => format!("JUMP_ABRUPT   {}", target(unit, *label)),
        Instruction::JumpIfKind(kind, label) => {
            format!("JUMP_IF_KIND  {kind} {}", target(unit, *label))
        }
        Instruction::JumpIfNotKind(kind, label) => {
            format!("JUMP_UNLESS   {kind} {}", target(unit, *label))
        }
        Instruction::JumpIfBreaksHere { labels, target: label } => {
            format!("JUMP_BREAK    {labels} {}", target(unit, *label))
        }
        Instruction::JumpIfContinuesHere { labels, target: label } => {
            format!("JUMP_CONTINUE {labels} {}", target(unit, *label))
        }
        Instruction::MergeCompletion => "MERGE".to_string(),
        Instruction::ConsumeBreak(labels) => format!("CONSUME_BREAK {labels}"),
        Instruction::UnwrapCompletion => "UNWRAP".to_string(),
    }
}
