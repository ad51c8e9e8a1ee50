use std::io::{stdout, IsTerminal};

use serde::Serialize;

use crate::challenge::{ChallengeDetail, LanguageChallenges};
use crate::executor::ExecutionResult;
use crate::outcome::ExecutionStatus;

/// Print an execution result, human-readable on a tty and JSON when piped.
pub fn report_result(result: &ExecutionResult) {
  if stdout().is_terminal() {
    report_result_human(result);
  } else {
    report_json(result);
  }
}

pub fn report_challenges(languages: &[LanguageChallenges]) {
  if stdout().is_terminal() {
    for language in languages {
      println!("\x1b[1m{}\x1b[22m", language.language);
      for unit in &language.units {
        println!("  {}  {}", unit.unit, unit.title);
      }
    }
  } else {
    report_json(&languages);
  }
}

pub fn report_detail(detail: &ChallengeDetail) {
  if stdout().is_terminal() {
    println!("\x1b[1m{}\x1b[22m ({}/{})", detail.title, detail.language, detail.unit);
    if !detail.instructions.is_empty() {
      println!();
      println!("{}", detail.instructions.trim_end());
    }
    println!();
    println!("\x1b[1mStarter code\x1b[22m");
    println!("{}", detail.starter_code.trim_end());
  } else {
    report_json(detail);
  }
}

fn report_result_human(result: &ExecutionResult) {
  let color = match result.status {
    ExecutionStatus::Passed => "\x1b[92m",
    ExecutionStatus::Timeout => "\x1b[93m",
    ExecutionStatus::Failed | ExecutionStatus::Error => "\x1b[91m",
  };

  println!();
  println!("\x1b[1mStatus\x1b[22m     {}{}\x1b[39m", color, result.status);
  println!("\x1b[1mExit code\x1b[22m  {}", result.exit_code);
  println!("\x1b[1mTime\x1b[22m       {:.3} s", result.duration);
  if !result.stdout.is_empty() {
    println!();
    println!("\x1b[1mstdout\x1b[22m");
    println!("{}", result.stdout.trim_end());
  }
  if !result.stderr.is_empty() {
    println!();
    println!("\x1b[1mstderr\x1b[22m");
    println!("{}", result.stderr.trim_end());
  }
  println!();
}

fn report_json<T: Serialize>(value: &T) {
  match serde_json::to_string_pretty(value) {
    Ok(text) => println!("{}", text),
    Err(err) => eprintln!("Serialize report fails: {}", err),
  }
}
