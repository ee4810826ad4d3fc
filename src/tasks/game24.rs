// src/tasks/game24.rs — Game of 24: combine four numbers with + - * / to make 24
//
// A state is a list of lines like "4 + 9 = 13 (left: 10 13 13)"; after three
// arithmetic steps the remaining number is 24 and the last step writes the
// full expression as "Answer: ...".

use minijinja::{context, Environment};

use super::Task;
use crate::core::config::PromptSample;
use crate::core::types::ThoughtState;
use crate::infra::errors::ArborError;
use crate::util::nonempty_lines;

pub const TASK_ID: &str = "game24";

/// Three arithmetic steps plus the answer line.
const DEFAULT_STEPS: usize = 4;

const STANDARD_PROMPT: &str = "\
Use numbers and basic arithmetic operations (+ - * /) to obtain 24.
Input: 4 4 6 8
Answer: (4 + 8) * (6 - 4) = 24
Input: 2 9 10 12
Answer: 2 * 12 * (10 - 9) = 24
Input: 4 9 10 13
Answer: (13 - 9) * (10 - 4) = 24
Input: {{ input }}
{% for step in steps %}{{ step }}
{% endfor %}";

const COT_PROMPT: &str = "\
Use numbers and basic arithmetic operations (+ - * /) to obtain 24. Each step, you are only allowed to choose two of the remaining numbers to obtain a new number.
Input: 4 4 6 8
Steps:
4 + 8 = 12 (left: 4 6 12)
6 - 4 = 2 (left: 2 12)
2 * 12 = 24 (left: 24)
Answer: (6 - 4) * (4 + 8) = 24
Input: 1 4 8 8
Steps:
8 / 4 = 2 (left: 1 2 8)
1 + 2 = 3 (left: 3 8)
3 * 8 = 24 (left: 24)
Answer: (1 + 8 / 4) * 8 = 24
Input: {{ input }}
Steps:
{% for step in steps %}{{ step }}
{% endfor %}";

const PROPOSE_PROMPT: &str = "\
Input: 2 8 8 14
Possible next steps:
2 + 8 = 10 (left: 8 10 14)
8 / 2 = 4 (left: 4 8 14)
14 + 2 = 16 (left: 8 8 16)
2 * 8 = 16 (left: 8 14 16)
8 - 2 = 6 (left: 6 8 14)
14 - 8 = 6 (left: 2 6 8)
14 / 2 = 7 (left: 7 8 8)
14 - 2 = 12 (left: 8 8 12)
Input: {{ numbers }}
Possible next steps:
";

const VALUE_PROMPT: &str = "\
Evaluate if given numbers can reach 24 (sure/likely/impossible)
10 14
10 + 14 = 24
sure
11 12
11 + 12 = 23
12 - 11 = 1
11 * 12 = 132
11 / 12 = 0.91
impossible
4 4 10
(10 - 4) * 4 = 6 * 4 = 24
sure
5 7 8
5 + 7 + 8 = 12 + 8 = 20
(8 - 5) * 7 = 3 * 7 = 21
I cannot obtain 24 now, but numbers are within a reasonable range
likely
1 3 3
1 * 3 * 3 = 9
(1 + 3) * 3 = 12
1 3 3 are all too small
impossible
{{ numbers }}
";

const VALUE_LAST_STEP_PROMPT: &str = "\
Use numbers and basic arithmetic operations (+ - * /) to obtain 24. Given an input and an answer, give a judgement (sure/impossible) if the answer is correct, i.e. it uses each input exactly once and no other numbers, and reach 24.
Input: 4 4 6 8
Answer: (4 + 8) * (6 - 4) = 24
Judge:
sure
Input: 4 9 10 13
Answer: (13 - 9) * (10 - 4) = 24
Judge:
sure
Input: 4 9 10 13
Answer: (13 - 9) * (10 - 4) + 1 = 24
Judge:
impossible
Input: 2 9 10 12
Answer: 2 * (12 - 10) = 24
Judge:
impossible
Input: {{ input }}
Answer: {{ answer }}
Judge:";

const VOTE_PROMPT: &str = "\
Given an instruction and several choices, decide which choice is most promising. Analyze each choice in detail, then conclude in the last line \"The best choice is {s}\", where s the integer id of the choice.
Instruction: use the numbers {{ input }} and basic arithmetic operations (+ - * /) to obtain 24.
{% for choice in choices %}Choice {{ loop.index }}:
{{ choice }}
{% endfor %}";

pub struct Game24 {
    steps: usize,
    env: Environment<'static>,
}

impl Default for Game24 {
    fn default() -> Self {
        Self::new()
    }
}

impl Game24 {
    pub fn new() -> Self {
        let mut env = Environment::new();
        // Prompts end where the model should continue writing.
        env.set_keep_trailing_newline(true);
        Self {
            steps: DEFAULT_STEPS,
            env,
        }
    }

    /// Override the round count, e.g. to stop before the answer line.
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    fn render(&self, template: &str, ctx: minijinja::Value) -> Result<String, ArborError> {
        self.env
            .render_str(template, ctx)
            .map_err(|e| ArborError::Other(anyhow::anyhow!("prompt render failed: {e}")))
    }
}

/// Numbers still in play: the puzzle at the root, else the "left:" list of
/// the last step. None once the last step no longer carries one.
pub fn current_numbers(input: &str, state: &ThoughtState) -> Option<String> {
    let Some(last) = state.last_step() else {
        return Some(input.trim().to_string());
    };
    let (_, after) = last.split_once("left: ")?;
    let numbers = after.split(')').next().unwrap_or(after).trim();
    Some(numbers.to_string())
}

fn is_answer_line(line: &str) -> bool {
    line.trim_start().to_ascii_lowercase().starts_with("answer")
}

fn answer_expression(line: &str) -> &str {
    let line = line.trim();
    match line.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("answer:") => line[7..].trim(),
        _ => line,
    }
}

impl Task for Game24 {
    fn id(&self) -> &str {
        TASK_ID
    }

    fn steps(&self) -> usize {
        self.steps
    }

    fn validate_input(&self, input: &str) -> Result<(), ArborError> {
        let numbers = extract_integers(input);
        let tokens = input.split_whitespace().count();
        if numbers.len() != 4 || tokens != 4 || numbers.iter().any(|&n| n <= 0) {
            return Err(ArborError::config(format!(
                "game24 input must be four positive integers, got '{input}'"
            )));
        }
        Ok(())
    }

    fn stop(&self, _depth: usize) -> Option<&str> {
        Some("\n")
    }

    fn sample_prompt(
        &self,
        input: &str,
        state: &ThoughtState,
        style: PromptSample,
    ) -> Result<String, ArborError> {
        let template = match style {
            PromptSample::Standard => STANDARD_PROMPT,
            PromptSample::Cot => COT_PROMPT,
        };
        self.render(template, context! { input => input, steps => state.steps() })
    }

    fn propose_prompt(&self, input: &str, state: &ThoughtState) -> Result<String, ArborError> {
        match current_numbers(input, state) {
            // Arithmetic is done: ask for the full expression.
            Some(numbers) if numbers == "24" => self.render(
                COT_PROMPT,
                context! { input => input, steps => state.steps() },
            ),
            Some(numbers) => self.render(PROPOSE_PROMPT, context! { numbers => numbers }),
            None => Err(ArborError::MalformedOutput {
                what: "game24 state".into(),
                output: state.text(),
            }),
        }
    }

    fn parse_proposals(&self, state: &ThoughtState, output: &str) -> Vec<String> {
        let lines: Vec<String> = nonempty_lines(output).map(String::from).collect();

        let finishing = state
            .last_step()
            .and_then(|_| current_numbers("", state))
            .is_some_and(|n| n == "24");
        if finishing {
            let answers: Vec<String> = lines.iter().filter(|l| is_answer_line(l)).cloned().collect();
            if !answers.is_empty() {
                return answers;
            }
        }
        lines
    }

    fn value_prompt(&self, input: &str, state: &ThoughtState) -> Result<String, ArborError> {
        match state.last_step() {
            Some(last) if !last.contains("left: ") => self.render(
                VALUE_LAST_STEP_PROMPT,
                context! { input => input, answer => answer_expression(last) },
            ),
            _ => {
                let numbers = current_numbers(input, state).unwrap_or_default();
                self.render(VALUE_PROMPT, context! { numbers => numbers })
            }
        }
    }

    fn static_value(&self, state: &ThoughtState) -> Option<f64> {
        // Out of steps without an answer: a dead end.
        let finished = state.depth() >= self.steps;
        let answered = state.steps().iter().any(|s| is_answer_line(s));
        (finished && !answered).then_some(0.0)
    }

    fn vote_prompt(&self, input: &str, states: &[&ThoughtState]) -> Result<String, ArborError> {
        let choices: Vec<String> = states.iter().map(|s| s.text()).collect();
        self.render(VOTE_PROMPT, context! { input => input, choices => choices })
    }

    fn test_output(&self, input: &str, output: &str) -> bool {
        let Some(last) = nonempty_lines(output).last() else {
            return false;
        };
        let answer = answer_expression(last);
        let expression = answer.split('=').next().unwrap_or("").trim();

        let mut used = extract_integers(expression);
        let mut given = extract_integers(input);
        used.sort_unstable();
        given.sort_unstable();
        if used != given {
            return false;
        }

        matches!(evaluate(expression), Some(v) if v == Rational::from(24))
    }
}

fn extract_integers(s: &str) -> Vec<i64> {
    s.split(|c: char| !c.is_ascii_digit())
        .filter(|t| !t.is_empty())
        .filter_map(|t| t.parse().ok())
        .collect()
}

/// Exact fraction so 8 / (3 - 8 / 3) really is 24.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rational {
    num: i64,
    den: i64,
}

impl From<i64> for Rational {
    fn from(n: i64) -> Self {
        Self { num: n, den: 1 }
    }
}

fn gcd(mut a: i64, mut b: i64) -> i64 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}

impl Rational {
    fn new(num: i64, den: i64) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let sign = if den < 0 { -1 } else { 1 };
        let g = gcd(num, den);
        Some(Self {
            num: sign * num / g,
            den: sign * den / g,
        })
    }

    fn add(self, o: Self) -> Option<Self> {
        let num = self
            .num
            .checked_mul(o.den)?
            .checked_add(o.num.checked_mul(self.den)?)?;
        Self::new(num, self.den.checked_mul(o.den)?)
    }

    fn sub(self, o: Self) -> Option<Self> {
        self.add(Self {
            num: o.num.checked_neg()?,
            den: o.den,
        })
    }

    fn mul(self, o: Self) -> Option<Self> {
        Self::new(self.num.checked_mul(o.num)?, self.den.checked_mul(o.den)?)
    }

    fn div(self, o: Self) -> Option<Self> {
        Self::new(self.num.checked_mul(o.den)?, self.den.checked_mul(o.num)?)
    }
}

/// Evaluate an arithmetic expression over integers with + - * / and parens.
fn evaluate(expression: &str) -> Option<Rational> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    (parser.pos == parser.tokens.len()).then_some(value)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(i64),
    Op(char),
    Open,
    Close,
}

fn tokenize(s: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = s.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' => {
                let mut n: i64 = 0;
                while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                    n = n.checked_mul(10)?.checked_add(d as i64)?;
                    chars.next();
                }
                tokens.push(Token::Num(n));
            }
            '+' | '-' | '*' | '/' => {
                tokens.push(Token::Op(c));
                chars.next();
            }
            '×' | 'x' => {
                tokens.push(Token::Op('*'));
                chars.next();
            }
            '÷' => {
                tokens.push(Token::Op('/'));
                chars.next();
            }
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            _ => return None,
        }
    }
    Some(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn expr(&mut self) -> Option<Rational> {
        let mut value = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' {
                value.add(rhs)?
            } else {
                value.sub(rhs)?
            };
        }
        Some(value)
    }

    fn term(&mut self) -> Option<Rational> {
        let mut value = self.factor()?;
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            value = if op == '*' {
                value.mul(rhs)?
            } else {
                value.div(rhs)?
            };
        }
        Some(value)
    }

    fn factor(&mut self) -> Option<Rational> {
        match self.peek()? {
            Token::Num(n) => {
                self.pos += 1;
                Some(Rational::from(n))
            }
            Token::Op('-') => {
                self.pos += 1;
                Rational::from(0).sub(self.factor()?)
            }
            Token::Open => {
                self.pos += 1;
                let value = self.expr()?;
                if self.peek()? != Token::Close {
                    return None;
                }
                self.pos += 1;
                Some(value)
            }
            _ => None,
        }
    }
}
