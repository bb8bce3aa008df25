//! User API.
//!
//! Calls about the current user need the user name configured on the core.

use crate::core::JenkinsCore;
use crate::error::{Error, Result};
use crate::http::RequestSpec;
use crate::types::{Token, User, UserForCreate};
use crate::util::generate_password;

/// Length of passwords generated by [`UserApi::create`].
const GENERATED_PASSWORD_LEN: usize = 8;

/// User API client.
pub struct UserApi {
    core: JenkinsCore,
}

impl UserApi {
    pub(crate) fn new(core: JenkinsCore) -> Self {
        Self { core }
    }

    fn current_user(&self) -> Result<&str> {
        self.core
            .user_name()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::Config("no user name configured".into()))
    }

    /// The current user.
    pub async fn get(&self) -> Result<User> {
        let path = format!("/user/{}/api/json", urlencoding::encode(self.current_user()?));
        self.core.request_with_data(RequestSpec::get(path)).await
    }

    /// Set the description of the current user.
    pub async fn edit_description(&self, description: &str) -> Result<()> {
        let path = format!(
            "/user/{}/submitDescription",
            urlencoding::encode(self.current_user()?)
        );
        let spec = RequestSpec::post(path).form([("description", description)]);
        self.core.request_without_data(spec).await?;
        Ok(())
    }

    /// Delete a user account.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let path = format!("/securityRealm/user/{}/doDelete", urlencoding::encode(name));
        let spec = RequestSpec::post(path).form_content_type();
        self.core.request_without_data(spec).await?;
        Ok(())
    }

    /// Create a user account in the built-in security realm.
    ///
    /// A random password is generated when `password` is `None`; the
    /// submitted form is returned so the caller can report it.
    pub async fn create(&self, name: &str, password: Option<&str>) -> Result<UserForCreate> {
        let password = match password {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => generate_password(GENERATED_PASSWORD_LEN),
        };
        let user = UserForCreate {
            username: name.to_string(),
            password1: password.clone(),
            password2: password,
            fullname: name.to_string(),
            email: format!("{name}@{name}.com"),
        };
        let spec = RequestSpec::post("/securityRealm/createAccountByAdmin").form([
            ("username", user.username.as_str()),
            ("password1", user.password1.as_str()),
            ("password2", user.password2.as_str()),
            ("fullname", user.fullname.as_str()),
            ("email", user.email.as_str()),
        ]);
        self.core.request_without_data(spec).await?;
        Ok(user)
    }

    /// Generate an API token called `token_name` for `target`, or for the
    /// current user when `target` is `None`.
    pub async fn create_token(&self, target: Option<&str>, token_name: &str) -> Result<Token> {
        let user = match target.filter(|t| !t.is_empty()) {
            Some(target) => target,
            None => self.current_user()?,
        };
        let path = format!(
            "/user/{}/descriptorByName/jenkins.security.ApiTokenProperty/generateNewToken",
            urlencoding::encode(user)
        );
        let spec = RequestSpec::post(path).form([("newTokenName", token_name)]);
        self.core.request_with_data(spec).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::test_support::*;
    use crate::client::JenkinsClient;
    use crate::http::Response;
    use crate::matcher::RequestMatcher;
    use crate::testing::{MockTransport, endpoint, expect_crumb};

    fn named_client(mock: &Arc<MockTransport>, user: &str) -> JenkinsClient {
        JenkinsClient::new(
            JenkinsCore::builder()
                .base_url(ROOT)
                .user_name(user)
                .transport(mock.clone())
                .build()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_get_user() {
        let mock = MockTransport::new();
        mock.expect(
            get("/user/admin/api/json").basic_auth("admin", "token").with_headers(),
            Response::new(200, r#"{"id":"admin","fullName":"admin","description":null}"#),
        );

        let user = client_with_auth(&mock, "admin", "token")
            .users()
            .get()
            .await
            .unwrap();
        assert_eq!(user.full_name, "admin");
        assert!(user.description.is_none());
    }

    #[tokio::test]
    async fn test_get_user_requires_name() {
        let mock = MockTransport::new();
        let err = client(&mock).users().get().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_edit_description() {
        let mock = MockTransport::new();
        let matcher = post(&mock, "/user/admin/submitDescription").body("description=fake+desc");
        mock.expect(matcher, Response::new(200, ""));

        named_client(&mock, "admin")
            .users()
            .edit_description("fake desc")
            .await
            .unwrap();
        mock.assert_satisfied();
    }

    #[tokio::test]
    async fn test_delete() {
        let mock = MockTransport::new();
        let matcher = post(&mock, "/securityRealm/user/fakeuser/doDelete");
        mock.expect(matcher, Response::new(200, ""));

        client(&mock).users().delete("fakeuser").await.unwrap();
        mock.assert_satisfied();
    }

    #[tokio::test]
    async fn test_create_generates_password() {
        let mock = MockTransport::new();
        expect_crumb(&mock, ROOT);
        mock.expect(
            RequestMatcher::new(
                reqwest::Method::POST,
                endpoint(ROOT, "/securityRealm/createAccountByAdmin"),
            ),
            Response::new(200, ""),
        );

        let user = client(&mock).users().create("fakeuser", None).await.unwrap();
        assert_eq!(user.username, "fakeuser");
        assert_eq!(user.password1, user.password2);
        assert_eq!(user.password1.len(), GENERATED_PASSWORD_LEN);
        assert_eq!(user.email, "fakeuser@fakeuser.com");

        let body = String::from_utf8_lossy(&mock.requests()[1].body).into_owned();
        assert!(body.contains(&format!("password1={}", user.password1)));
    }

    #[tokio::test]
    async fn test_create_with_password() {
        let mock = MockTransport::new();
        let matcher = post(&mock, "/securityRealm/createAccountByAdmin").body(
            "username=fakeuser&password1=secret&password2=secret&fullname=fakeuser\
             &email=fakeuser%40fakeuser.com",
        );
        mock.expect(matcher, Response::new(200, ""));

        client(&mock)
            .users()
            .create("fakeuser", Some("secret"))
            .await
            .unwrap();
        mock.assert_satisfied();
    }

    #[tokio::test]
    async fn test_create_token() {
        let mock = MockTransport::new();
        let matcher = post(
            &mock,
            "/user/admin/descriptorByName/jenkins.security.ApiTokenProperty/generateNewToken",
        )
        .body("newTokenName=fakeToken");
        mock.expect(
            matcher,
            Response::new(
                200,
                r#"{"status":"ok","data":{"tokenName":"fakeToken","tokenUuid":"uuid","tokenValue":"value"}}"#,
            ),
        );

        let token = named_client(&mock, "admin")
            .users()
            .create_token(None, "fakeToken")
            .await
            .unwrap();
        assert_eq!(token.status, "ok");
        assert_eq!(token.data.token_value, "value");
        mock.assert_satisfied();
    }
}
