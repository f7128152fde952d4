//! Offline judge comparing answers against the accepted forms.

use futures::future::BoxFuture;

use super::{AnswerJudge, JudgeError, JudgeRequest, Verdict};

/// Accepts an answer when it matches any accepted form, ignoring case and
/// surrounding whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatchJudge;

impl ExactMatchJudge {
    fn rule(request: &JudgeRequest) -> Verdict {
        let given = normalize(&request.given_answer);
        let correct = !given.is_empty()
            && request
                .expected_answer
                .split(';')
                .map(normalize)
                .any(|form| form == given);

        let commentary = if correct {
            format!("{} says: that's right!", request.host_name)
        } else {
            format!("{} says: no, that's not it.", request.host_name)
        };
        Verdict {
            correct,
            commentary,
        }
    }
}

impl AnswerJudge for ExactMatchJudge {
    fn judge(&self, request: JudgeRequest) -> BoxFuture<'static, Result<Verdict, JudgeError>> {
        Box::pin(async move { Ok(Self::rule(&request)) })
    }

    fn name(&self) -> &'static str {
        "exact-match"
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(given: &str, expected: &str) -> JudgeRequest {
        JudgeRequest {
            host_name: "Host".into(),
            host_prompt: String::new(),
            question: "Longest river in Europe?".into(),
            given_answer: given.into(),
            expected_answer: expected.into(),
        }
    }

    #[tokio::test]
    async fn matches_any_accepted_form_ignoring_case() {
        let verdict = ExactMatchJudge
            .judge(request("  volga ", "Volga; Волга"))
            .await
            .unwrap();
        assert!(verdict.correct);

        let verdict = ExactMatchJudge
            .judge(request("волга", "Volga; Волга"))
            .await
            .unwrap();
        assert!(verdict.correct);
    }

    #[tokio::test]
    async fn blank_or_different_answers_are_wrong() {
        for given in ["", "   ", "Danube"] {
            let verdict = ExactMatchJudge
                .judge(request(given, "Volga"))
                .await
                .unwrap();
            assert!(!verdict.correct, "{given:?} should be rejected");
            assert!(verdict.commentary.starts_with("Host"));
        }
    }
}
