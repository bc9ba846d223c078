//! The scripting-language collaborator.
//!
//! This crate embeds a scripting runtime but does not implement one: per
//! scope, "the scripting language itself" is an external collaborator
//! assumed to provide evaluation, variables, a result slot, and
//! errorCode/errorInfo. [`Interpreter`] is that collaborator's interface as
//! seen from the actor runtime. Each actor owns exactly one `Interpreter`
//! and it is never touched from any other thread.
//!
//! [`EchoInterpreter`] is a minimal reference implementation used by this
//! crate's own tests (and usable as a starting point by embedders who don't
//! yet have a real scripting backend wired up). It understands just enough
//! of a toy expression language to make the round-trip and error-handling
//! tests in the runtime meaningful.

/// Outcome of evaluating one script in an [`Interpreter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalOutcome {
    /// `true` if evaluation succeeded.
    pub ok: bool,
    /// The interpreter's result string (or error message on failure).
    pub result: String,
    /// The interpreter's `errorCode`, set only when `ok` is `false`.
    pub error_code: String,
    /// The interpreter's `errorInfo`, set only when `ok` is `false`.
    pub error_info: String,
}

impl EvalOutcome {
    /// Build a successful outcome with the given result string.
    #[must_use]
    pub fn ok(result: impl Into<String>) -> Self {
        Self {
            ok: true,
            result: result.into(),
            error_code: String::new(),
            error_info: String::new(),
        }
    }

    /// Build a failed outcome with the given error code/info/message.
    #[must_use]
    pub fn error(
        code: impl Into<String>,
        info: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            ok: false,
            result: message.into(),
            error_code: code.into(),
            error_info: info.into(),
        }
    }
}

/// One embedded script interpreter, exclusively owned by a single actor
/// thread.
///
/// Implementors provide `Eval` plus the variable-setting hook used by
/// async-with-callback sends (spec §4.E) and a hint for whether the last
/// evaluated script requested the owning actor's event loop to exit (the
/// `exit`/`unwind` commands in spec §6 are themselves script-level
/// operations the interpreter recognizes; the runtime only asks whether
/// they fired).
pub trait Interpreter: Send + 'static {
    /// Evaluate `script` and return its outcome.
    fn eval(&mut self, script: &str) -> EvalOutcome;

    /// Set a variable in this interpreter's global scope (used to deliver
    /// async-with-callback results and, on error, `errorCode`/`errorInfo`).
    fn set_var(&mut self, name: &str, value: &str);

    /// `true` once this interpreter has evaluated a script that requested
    /// the owning actor leave its event loop (`exit` or a completed
    /// `unwind`).
    fn wants_exit(&self) -> bool {
        false
    }

    /// `true` once this interpreter has evaluated a script that requested
    /// a hard `ExitThread` — terminate without running the normal exit
    /// sequence (spec §4.F; documented as leaking).
    fn wants_hard_exit(&self) -> bool {
        false
    }
}

impl Interpreter for Box<dyn Interpreter> {
    fn eval(&mut self, script: &str) -> EvalOutcome {
        (**self).eval(script)
    }

    fn set_var(&mut self, name: &str, value: &str) {
        (**self).set_var(name, value);
    }

    fn wants_exit(&self) -> bool {
        (**self).wants_exit()
    }

    fn wants_hard_exit(&self) -> bool {
        (**self).wants_hard_exit()
    }
}

/// A minimal reference [`Interpreter`] understanding:
///
/// - `expr {A OP B}` for `OP` in `+ - * /` on integers, e.g. `expr {2+3}`.
/// - `exit` — marks the interpreter as wanting to leave its event loop.
/// - `error MESSAGE` — fails with errorCode `"ECUSTOM"`.
/// - anything else is echoed back verbatim as the result.
#[derive(Debug, Default)]
pub struct EchoInterpreter {
    exiting: bool,
}

impl EchoInterpreter {
    /// Create a fresh interpreter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn eval_expr(body: &str) -> Option<EvalOutcome> {
        let body = body.trim();
        for op in ['+', '-', '*', '/'] {
            if let Some(idx) = body.find(op) {
                let (lhs, rhs) = body.split_at(idx);
                let rhs = &rhs[1..];
                let (Ok(a), Ok(b)) = (lhs.trim().parse::<i64>(), rhs.trim().parse::<i64>())
                else {
                    continue;
                };
                let value = match op {
                    '+' => a + b,
                    '-' => a - b,
                    '*' => a * b,
                    '/' => {
                        if b == 0 {
                            return Some(EvalOutcome::error(
                                "ARITH DIVZERO",
                                "divide by zero",
                                "divide by zero",
                            ));
                        }
                        a / b
                    }
                    _ => unreachable!(),
                };
                return Some(EvalOutcome::ok(value.to_string()));
            }
        }
        body.parse::<i64>().ok().map(|v| EvalOutcome::ok(v.to_string()))
    }
}

impl Interpreter for EchoInterpreter {
    fn eval(&mut self, script: &str) -> EvalOutcome {
        let script = script.trim();
        if script == "exit" {
            self.exiting = true;
            return EvalOutcome::ok("");
        }
        if let Some(rest) = script.strip_prefix("error ") {
            return EvalOutcome::error("ECUSTOM", rest, rest);
        }
        if let Some(rest) = script.strip_prefix("expr ") {
            let rest = rest.trim().trim_start_matches('{').trim_end_matches('}');
            if let Some(outcome) = Self::eval_expr(rest) {
                return outcome;
            }
        }
        EvalOutcome::ok(script)
    }

    fn set_var(&mut self, _name: &str, _value: &str) {}

    fn wants_exit(&self) -> bool {
        self.exiting
    }
}
