//! Join URL validation and real-time endpoint derivation.

use url::Url;

/// Fixed path of the GraphQL WebSocket endpoint on the conferencing host
pub const REALTIME_PATH: &str = "/graphql";

/// Check if a string is an absolute URL with scheme `http` or `https`.
pub fn validate(url_string: &str) -> bool {
    parse_http_url(url_string).is_some()
}

/// Parse a string as an absolute http(s) URL.
pub fn parse_http_url(url_string: &str) -> Option<Url> {
    let url = Url::parse(url_string).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Derive the GraphQL WebSocket endpoint from a join URL.
///
/// Only the host of the join URL is kept: the endpoint is always
/// `wss://{host}/graphql`, whatever the join URL's port, path or query.
///
/// # Returns
///
/// `None` if the join URL is not a valid http(s) URL
pub fn derive_realtime_endpoint(join_url: &str) -> Option<Url> {
    let url = parse_http_url(join_url)?;
    let host = url.host_str()?;
    Url::parse(&format!("wss://{}{}", host, REALTIME_PATH)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_http_and_https() {
        // テスト項目: http / https の絶対 URL は有効と判定される
        // given (前提条件):
        let urls = [
            "http://bbb.example.com/bigbluebutton/api/join?x=1",
            "https://bbb.example.com",
        ];

        // when (操作):
        let results: Vec<bool> = urls.iter().map(|u| validate(u)).collect();

        // then (期待する結果):
        assert_eq!(results, vec![true, true]);
    }

    #[test]
    fn test_validate_rejects_other_strings() {
        // テスト項目: http(s) 以外の文字列は無効と判定される
        // given (前提条件):
        let invalid = [
            "",
            "not a url",
            "bbb.example.com/join",
            "/bigbluebutton/api/join",
            "ftp://bbb.example.com/file",
            "wss://bbb.example.com/graphql",
            "mailto:someone@example.com",
        ];

        for candidate in invalid {
            // when (操作):
            let valid = validate(candidate);

            // then (期待する結果):
            assert!(!valid, "{candidate:?} should be rejected");
        }
    }

    #[test]
    fn test_derive_realtime_endpoint_returns_none_for_invalid_urls() {
        // テスト項目: 無効な URL からはエンドポイントを導出しない
        // given (前提条件):
        let invalid = ["", "garbage", "ftp://host/x", "https://"];

        for candidate in invalid {
            // when (操作):
            let endpoint = derive_realtime_endpoint(candidate);

            // then (期待する結果):
            assert!(endpoint.is_none(), "{candidate:?} should not derive");
        }
    }

    #[test]
    fn test_derive_realtime_endpoint_keeps_only_host() {
        // テスト項目: ホスト名のみを残して wss://{host}/graphql を導出する
        // given (前提条件):
        let join_url = "https://host.example/x/y";

        // when (操作):
        let endpoint = derive_realtime_endpoint(join_url);

        // then (期待する結果):
        assert_eq!(
            endpoint.map(|u| u.to_string()),
            Some("wss://host.example/graphql".to_string())
        );
    }

    #[test]
    fn test_derive_realtime_endpoint_discards_port_path_and_query() {
        // テスト項目: ポート・パス・クエリは導出結果に含まれない
        // given (前提条件):
        let join_url = "http://bbb.example.com:8443/bigbluebutton/api/join?meetingID=a&checksum=b";

        // when (操作):
        let endpoint = derive_realtime_endpoint(join_url).unwrap();

        // then (期待する結果):
        assert_eq!(endpoint.as_str(), "wss://bbb.example.com/graphql");
        assert_eq!(endpoint.port(), None);
        assert_eq!(endpoint.query(), None);
    }
}
