//! End-to-end tests against a scripted stand-in for the aws CLI
#![cfg(unix)]

use serde_json::json;
use std::path::Path;
use tempfile::TempDir;
use tenantflow_cloud::{
    AccountContext, CloudError, PollOutcome, Reconciler, ResourceApi, ResourceKind,
    ResourceRequest, RetryPolicy,
};
use tenantflow_cloud_aws::{AwsCli, AwsError, AwsResourceApi};

const FAKE_AWS: &str = r#"#!/bin/sh
dir=$(dirname "$0")

next_count() {
    n=$(cat "$dir/$1" 2>/dev/null || echo 0)
    n=$((n + 1))
    echo "$n" > "$dir/$1"
    echo "$n"
}

if [ "$3" = "--cli-input-json" ]; then
    input="${4#file://}"
    if [ "$input" = "$4" ] || [ ! -f "$input" ]; then
        echo "expected a file:// input document, got: $4" >&2
        exit 2
    fi
fi

case "$2" in
  create-dashboard)
    wc -c < "$input" > "$dir/dashboard-input-size"
    echo '{"Status": 202, "DashboardId": "acme-dashboard", "CreationStatus": "CREATION_IN_PROGRESS"}' ;;
  describe-dashboard)
    n=$(next_count dashboard)
    if [ "$n" -lt 3 ]; then s=CREATION_IN_PROGRESS; else s=CREATION_SUCCESSFUL; fi
    echo "{\"Dashboard\": {\"DashboardId\": \"acme-dashboard\", \"Version\": {\"Status\": \"$s\"}}}" ;;
  create-template)
    echo "An error occurred (ResourceExistsException) when calling the CreateTemplate operation: Template minimal-template already exists" >&2
    exit 254 ;;
  create-analysis)
    echo "An error occurred (InvalidParameterValueException) when calling the CreateAnalysis operation: SourceEntity is invalid" >&2
    exit 254 ;;
  create-role)
    echo '{"Role": {"RoleName": "acmeTenantRole", "Arn": "arn:aws:iam::123456789012:role/acmeTenantRole"}}' ;;
  get-role)
    n=$(next_count role)
    if [ "$n" -lt 2 ]; then
      echo "An error occurred (NoSuchEntity) when calling the GetRole operation: The role with name acmeTenantRole cannot be found." >&2
      exit 254
    fi
    echo '{"Role": {"RoleName": "acmeTenantRole", "Arn": "arn:aws:iam::123456789012:role/acmeTenantRole"}}' ;;
  put-role-policy) ;;
  get-caller-identity)
    case "$*" in
      *"--profile tenant-admin"*) user=tenant-admin ;;
      *) user=ci ;;
    esac
    echo "{\"UserId\": \"AIDAEXAMPLE\", \"Account\": \"123456789012\", \"Arn\": \"arn:aws:iam::123456789012:user/$user\"}" ;;
  *)
    echo "unexpected call: $1 $2" >&2
    exit 2 ;;
esac
"#;

fn fake_api(dir: &Path) -> AwsResourceApi {
    let script = dir.join("aws");
    std::fs::write(&script, FAKE_AWS).unwrap();
    let cli = AwsCli::new(Some("ap-southeast-1".to_string()))
        .with_launcher("sh", vec![script.to_string_lossy().to_string()]);
    AwsResourceApi::with_cli(cli)
}

fn reconciler(dir: &Path) -> Reconciler<AwsResourceApi> {
    let fast = RetryPolicy::from_millis(0, 5).unwrap();
    Reconciler::new(
        fake_api(dir),
        AccountContext::new("123456789012", "ap-southeast-1"),
    )
    .with_policy_override(ResourceKind::Dashboard, fast)
    .with_policy_override(ResourceKind::IamRole, fast)
}

#[tokio::test]
async fn test_dashboard_becomes_ready() {
    let dir = TempDir::new().unwrap();
    let request = ResourceRequest::new(
        ResourceKind::Dashboard,
        json!({"AwsAccountId": "123456789012", "DashboardId": "acme-dashboard", "Name": "Acme"}),
    );

    let outcome = reconciler(dir.path())
        .create_and_wait(&request)
        .await
        .unwrap();

    match outcome {
        PollOutcome::Ready { response, attempts } => {
            assert_eq!(attempts, 3);
            assert_eq!(response["Dashboard"]["Version"]["Status"], "CREATION_SUCCESSFUL");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_large_definition_reaches_cli() {
    let dir = TempDir::new().unwrap();
    let blob = "x".repeat(200 * 1024);
    let request = ResourceRequest::new(
        ResourceKind::Dashboard,
        json!({
            "AwsAccountId": "123456789012",
            "DashboardId": "acme-dashboard",
            "Name": "Acme",
            "Definition": {"Blob": blob}
        }),
    );

    let outcome = reconciler(dir.path())
        .create_and_wait(&request)
        .await
        .unwrap();
    assert!(outcome.is_ready());

    let size: usize = std::fs::read_to_string(dir.path().join("dashboard-input-size"))
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert!(size > 200 * 1024, "input document was {} bytes", size);
}

#[tokio::test]
async fn test_existing_template_is_skipped() {
    let dir = TempDir::new().unwrap();
    let request = ResourceRequest::new(
        ResourceKind::Template,
        json!({"AwsAccountId": "123456789012", "TemplateId": "minimal-template"}),
    );

    let outcome = reconciler(dir.path())
        .create_and_wait(&request)
        .await
        .unwrap();
    assert_eq!(outcome, PollOutcome::AlreadyExists);
}

#[tokio::test]
async fn test_rejected_analysis() {
    let dir = TempDir::new().unwrap();
    let request = ResourceRequest::new(
        ResourceKind::Analysis,
        json!({"AwsAccountId": "123456789012", "AnalysisId": "acme-analysis"}),
    );

    let err = reconciler(dir.path())
        .create_and_wait(&request)
        .await
        .unwrap_err();
    match err {
        CloudError::CreationRejected { kind, key, reason } => {
            assert_eq!(kind, ResourceKind::Analysis);
            assert_eq!(key, "acme-analysis");
            assert!(reason.contains("SourceEntity is invalid"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_role_waits_until_visible() {
    let dir = TempDir::new().unwrap();
    let request = ResourceRequest::new(
        ResourceKind::IamRole,
        json!({"RoleName": "acmeTenantRole", "AssumeRolePolicyDocument": "{}"}),
    );

    let outcome = reconciler(dir.path())
        .create_and_wait(&request)
        .await
        .unwrap();
    assert!(outcome.is_ready());
    assert_eq!(outcome.attempts(), 2);
}

#[tokio::test]
async fn test_role_policy_has_empty_response() {
    let dir = TempDir::new().unwrap();
    let request = ResourceRequest::new(
        ResourceKind::RolePolicy,
        json!({"RoleName": "acmeTenantRole", "PolicyName": "tenant-access", "PolicyDocument": "{}"}),
    );

    let outcome = reconciler(dir.path())
        .create_and_wait(&request)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        PollOutcome::Ready {
            response: json!({}),
            attempts: 0
        }
    );
}

#[tokio::test]
async fn test_check_auth() {
    let dir = TempDir::new().unwrap();
    let status = fake_api(dir.path()).check_auth().await.unwrap();

    assert!(status.authenticated);
    let info = status.account_info.unwrap();
    assert!(info.contains("123456789012"));
    assert!(info.contains("user/ci"));
}

#[tokio::test]
async fn test_check_auth_with_profile() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("aws");
    std::fs::write(&script, FAKE_AWS).unwrap();
    let cli = AwsCli::new(Some("ap-southeast-1".to_string()))
        .with_profile("tenant-admin")
        .with_launcher("sh", vec![script.to_string_lossy().to_string()]);

    let status = AwsResourceApi::with_cli(cli).check_auth().await.unwrap();
    assert!(status.account_info.unwrap().contains("user/tenant-admin"));
}

#[tokio::test]
async fn test_missing_cli() {
    let cli = AwsCli::new(None).with_launcher("tenantflow-no-such-binary", Vec::new());
    let err = cli
        .call("sts", "get-caller-identity", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, AwsError::AwsNotFound));

    let status = AwsResourceApi::with_cli(cli).check_auth().await.unwrap();
    assert!(!status.authenticated);
}
