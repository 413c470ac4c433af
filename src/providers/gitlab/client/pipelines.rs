use url::Url;

use super::core::{GitLabClient, PAGE_SIZE};
use crate::error::{PipetrendError, Result};
use crate::providers::gitlab::types::{GitLabPipeline, GitLabVariable};
use crate::report::ReportPeriod;

impl GitLabClient {
    /// Builds a project-scoped endpoint URL.
    ///
    /// The project path goes into a single URL segment, so any `/` inside it
    /// must stay percent-encoded (`group/project` -> `group%2Fproject`).
    /// Numeric project IDs pass through unchanged.
    fn project_url(&self, project: &str, tail: &str) -> Result<Url> {
        let encoded = project.replace('/', "%2F");
        self.api_url
            .join(&format!("projects/{encoded}/{tail}"))
            .map_err(|e| PipetrendError::Config(format!("Invalid project URL: {e}")))
    }

    /// Fetches pipelines created within the period, paginating until `limit`
    /// pipelines are collected or a short page signals the end.
    pub async fn list_pipelines(
        &self,
        project: &str,
        period: &ReportPeriod,
        limit: usize,
    ) -> Result<Vec<GitLabPipeline>> {
        let mut all_pipelines = Vec::new();
        let per_page = PAGE_SIZE.min(limit.max(1));
        let mut page = 1usize;

        loop {
            let mut url = self.project_url(project, "pipelines")?;
            url.query_pairs_mut()
                .append_pair("created_after", &period.created_after.to_rfc3339())
                .append_pair("created_before", &period.created_before.to_rfc3339())
                .append_pair("per_page", &per_page.to_string())
                .append_pair("page", &page.to_string());

            let pipelines: Vec<GitLabPipeline> = self.get_json(url).await?;
            let fetched_count = pipelines.len();
            all_pipelines.extend(pipelines);

            if fetched_count < per_page || all_pipelines.len() >= limit {
                break;
            }

            page += 1;
        }

        all_pipelines.truncate(limit);

        Ok(all_pipelines)
    }

    /// Fetches the variables recorded for one pipeline.
    ///
    /// A 404 means no variables were recorded for the pipeline and maps to an
    /// empty list rather than an error.
    pub async fn pipeline_variables(
        &self,
        project: &str,
        pipeline_id: u64,
    ) -> Result<Vec<GitLabVariable>> {
        let url = self.project_url(project, &format!("pipelines/{pipeline_id}/variables"))?;

        match self.get_json(url).await {
            Ok(variables) => Ok(variables),
            Err(PipetrendError::Api { status: 404, .. }) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Token;
    use mockito::{Matcher, Server, ServerGuard};

    fn client_for(server: &ServerGuard) -> GitLabClient {
        GitLabClient::new(&server.url(), Some(Token::from("glpat-test"))).unwrap()
    }

    fn pipeline_rows(first_id: u64, count: u64) -> String {
        let rows: Vec<serde_json::Value> = (first_id..first_id + count)
            .map(|id| {
                serde_json::json!({
                    "id": id,
                    "status": "success",
                    "ref": "main",
                    "created_at": "2022-06-01T12:00:00Z",
                    "web_url": format!("https://gitlab.example.com/group/project/-/pipelines/{id}")
                })
            })
            .collect();
        serde_json::to_string(&rows).unwrap()
    }

    #[test]
    fn project_url_encodes_the_path_as_one_segment() {
        let client = GitLabClient::new("https://gitlab.example.com", None).unwrap();
        let url = client.project_url("group/project", "pipelines").unwrap();
        assert_eq!(
            url.as_str(),
            "https://gitlab.example.com/api/v4/projects/group%2Fproject/pipelines"
        );
    }

    #[test]
    fn project_url_accepts_numeric_ids() {
        let client = GitLabClient::new("https://gitlab.example.com", None).unwrap();
        let url = client.project_url("123", "pipelines/7/variables").unwrap();
        assert_eq!(
            url.as_str(),
            "https://gitlab.example.com/api/v4/projects/123/pipelines/7/variables"
        );
    }

    #[tokio::test]
    async fn list_pipelines_sends_auth_and_date_range() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v4/projects/123/pipelines")
            .match_header("private-token", "glpat-test")
            .match_query(Matcher::AllOf(vec![
                Matcher::Regex("created_after=2022-01-01".to_string()),
                Matcher::Regex("created_before=2022-12-31".to_string()),
                Matcher::Regex("&page=1$".to_string()),
            ]))
            .with_status(200)
            .with_body(pipeline_rows(1, 2))
            .create_async()
            .await;

        let client = client_for(&server);
        let period = ReportPeriod::year(2022).unwrap();
        let pipelines = client.list_pipelines("123", &period, 50).await.unwrap();

        mock.assert_async().await;
        assert_eq!(pipelines.len(), 2);
        assert_eq!(pipelines[0].id, 1);
        assert_eq!(pipelines[0].status.as_deref(), Some("success"));
    }

    #[tokio::test]
    async fn list_pipelines_paginates_until_a_short_page() {
        let mut server = Server::new_async().await;
        let first_page = server
            .mock("GET", "/api/v4/projects/123/pipelines")
            .match_query(Matcher::Regex("&page=1$".to_string()))
            .with_status(200)
            .with_body(pipeline_rows(1, 100))
            .create_async()
            .await;
        let second_page = server
            .mock("GET", "/api/v4/projects/123/pipelines")
            .match_query(Matcher::Regex("&page=2$".to_string()))
            .with_status(200)
            .with_body(pipeline_rows(101, 20))
            .create_async()
            .await;

        let client = client_for(&server);
        let period = ReportPeriod::year(2022).unwrap();
        let pipelines = client.list_pipelines("123", &period, 500).await.unwrap();

        first_page.assert_async().await;
        second_page.assert_async().await;
        assert_eq!(pipelines.len(), 120);
        assert_eq!(pipelines.last().unwrap().id, 120);
    }

    #[tokio::test]
    async fn list_pipelines_truncates_to_the_limit() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v4/projects/123/pipelines")
            .match_query(Matcher::Regex("per_page=10".to_string()))
            .with_status(200)
            .with_body(pipeline_rows(1, 10))
            .create_async()
            .await;

        let client = client_for(&server);
        let period = ReportPeriod::year(2022).unwrap();
        let pipelines = client.list_pipelines("123", &period, 10).await.unwrap();

        assert_eq!(pipelines.len(), 10);
    }

    #[tokio::test]
    async fn pipeline_variables_decodes_key_value_pairs() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v4/projects/123/pipelines/7/variables")
            .with_status(200)
            .with_body(
                r#"[{"key": "STAGE", "variable_type": "env_var", "value": "deploy"},
                    {"key": "ENVIRONMENT", "variable_type": "env_var", "value": "prod"}]"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let variables = client.pipeline_variables("123", 7).await.unwrap();

        assert_eq!(variables.len(), 2);
        assert_eq!(variables[0].key, "STAGE");
        assert_eq!(variables[0].value, "deploy");
    }

    #[tokio::test]
    async fn pipeline_variables_treats_404_as_empty() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v4/projects/123/pipelines/8/variables")
            .with_status(404)
            .with_body(r#"{"message": "404 Not found"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let variables = client.pipeline_variables("123", 8).await.unwrap();

        assert!(variables.is_empty());
    }

    #[tokio::test]
    async fn forbidden_surfaces_as_an_api_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v4/projects/123/pipelines/9/variables")
            .with_status(403)
            .with_body(r#"{"message": "403 Forbidden"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.pipeline_variables("123", 9).await;

        assert!(matches!(
            result,
            Err(PipetrendError::Api { status: 403, .. })
        ));
    }
}
