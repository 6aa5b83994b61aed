fn main() {
    println!("Run `cargo test -p scp-roundtrip` to execute protocol round-trip tests.");
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
    use tokio::io::AsyncReadExt;

    use skiff_scp::{Command, Flags, Parameters, ScpError, Side};
    use skiff_scp_http::{download_command, upload_command};

    /// Wires two commands together over an in-memory channel and runs both
    /// to completion.
    async fn run_pair(mut source: Command, mut sink: Command) -> Result<(), ScpError> {
        let (mut a, mut b) = tokio::io::duplex(64 * 1024);
        let source_task = tokio::spawn(async move {
            let result = source.execute(&mut a).await;
            drop(a);
            result
        });

        let sink_result = sink.execute(&mut b).await;
        source_task.await.expect("source task panicked")?;
        sink_result
    }

    fn local_source(targets: Vec<std::path::PathBuf>, recursive: bool) -> Command {
        Command::new(Parameters {
            flags: Flags {
                source: true,
                recursive,
                targets,
                ..Flags::default()
            },
            remote_location: "peer:/unused".into(),
            ..Parameters::default()
        })
        .unwrap()
    }

    fn local_sink(target: &Path, recursive: bool, side: Side) -> Command {
        Command::new(Parameters {
            flags: Flags {
                sink: true,
                recursive,
                targets: vec![target.to_path_buf()],
                ..Flags::default()
            },
            side,
            remote_location: "peer:/unused".into(),
            ..Parameters::default()
        })
        .unwrap()
    }

    #[cfg(unix)]
    fn chmod(path: &Path, mode: u32) {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).unwrap();
    }

    #[tokio::test]
    async fn send_file_round_trip() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let target = src.path().join("target");
        std::fs::write(&target, b"hello, send file!").unwrap();
        #[cfg(unix)]
        chmod(&target, 0o666);

        run_pair(
            local_source(vec![target], false),
            local_sink(out.path(), false, Side::Client),
        )
        .await
        .unwrap();

        let received = std::fs::read(out.path().join("target")).unwrap();
        assert_eq!(received, b"hello, send file!");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(out.path().join("target"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o7777, 0o666);
        }
    }

    #[tokio::test]
    async fn recursive_directory_round_trip() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let dir = src.path().join("payload");
        std::fs::create_dir_all(dir.join("target_dir")).unwrap();
        std::fs::write(dir.join("target_dir/target1"), b"file 1").unwrap();
        std::fs::write(dir.join("target2"), b"file 2").unwrap();

        run_pair(
            local_source(vec![dir.clone()], true),
            local_sink(out.path(), true, Side::Client),
        )
        .await
        .unwrap();

        let base = out.path().join("payload");
        assert_eq!(
            std::fs::read(base.join("target_dir/target1")).unwrap(),
            b"file 1"
        );
        assert_eq!(std::fs::read(base.join("target2")).unwrap(), b"file 2");
    }

    #[tokio::test]
    async fn zero_length_file_round_trip() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let target = src.path().join("empty");
        std::fs::write(&target, b"").unwrap();

        run_pair(
            local_source(vec![target], false),
            local_sink(out.path(), false, Side::Client),
        )
        .await
        .unwrap();

        assert_eq!(std::fs::read(out.path().join("empty")).unwrap(), b"");
    }

    #[tokio::test]
    async fn file_name_with_spaces_round_trip() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let target = src.path().join("a file with spaces.txt");
        std::fs::write(&target, b"spaced out").unwrap();

        run_pair(
            local_source(vec![target], false),
            local_sink(out.path(), false, Side::Client),
        )
        .await
        .unwrap();

        assert_eq!(
            std::fs::read(out.path().join("a file with spaces.txt")).unwrap(),
            b"spaced out"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn restrictive_mode_round_trip() {
        use std::os::unix::fs::PermissionsExt;

        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let target = src.path().join("secret");
        std::fs::write(&target, b"key material").unwrap();
        chmod(&target, 0o600);

        run_pair(
            local_source(vec![target], false),
            local_sink(out.path(), false, Side::Client),
        )
        .await
        .unwrap();

        let mode = std::fs::metadata(out.path().join("secret"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o7777, 0o600);
    }

    #[tokio::test]
    async fn overwrite_mode_writes_the_target_itself() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let target = src.path().join("source-name");
        std::fs::write(&target, b"payload").unwrap();
        let destination = out.path().join("destination-name");

        run_pair(
            local_source(vec![target], false),
            local_sink(&destination, false, Side::Client),
        )
        .await
        .unwrap();

        assert_eq!(std::fs::read(&destination).unwrap(), b"payload");
        assert!(!out.path().join("source-name").exists());
    }

    #[tokio::test]
    async fn http_upload_lands_at_the_sink() {
        let out = tempfile::tempdir().unwrap();

        let upload =
            upload_command("/tmp/target", Box::new(&b"hello"[..]), 5, None).unwrap();

        run_pair(upload, local_sink(out.path(), false, Side::Client))
            .await
            .unwrap();

        assert_eq!(std::fs::read(out.path().join("target")).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn http_download_streams_body_and_headers() {
        let src = tempfile::tempdir().unwrap();
        let source_file = src.path().join("payload.bin");
        std::fs::write(&source_file, b"hello, file contents!").unwrap();

        let (body_writer, mut body_reader) = tokio::io::duplex(64 * 1024);
        let (download, headers_rx) =
            download_command("/home/robots.txt", Box::new(body_writer), None).unwrap();

        run_pair(local_source(vec![source_file], false), download)
            .await
            .unwrap();

        let headers = headers_rx.await.unwrap();
        assert_eq!(headers[CONTENT_LENGTH], "21");
        assert_eq!(headers[CONTENT_TYPE], "application/octet-stream");
        assert_eq!(
            headers[CONTENT_DISPOSITION],
            "attachment;filename=\"robots.txt\""
        );

        let mut body = Vec::new();
        body_reader.read_to_end(&mut body).await.unwrap();
        assert_eq!(body, b"hello, file contents!");
    }

    #[tokio::test]
    async fn server_sink_reports_errors_in_band() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let target = src.path().join("f");
        std::fs::write(&target, b"data").unwrap();

        // The server's destination directory is missing, so its backend
        // fails; the client must see the failure as a peer error.
        let missing = out.path().join("missing/nested");
        let mut client = local_source(vec![target], false);
        let mut server = local_sink(&missing, false, Side::Server);

        let (mut a, mut b) = tokio::io::duplex(64 * 1024);
        let server_task = tokio::spawn(async move {
            let result = server.execute(&mut b).await;
            drop(b);
            result
        });

        let client_err = client.execute(&mut a).await.unwrap_err();
        drop(a);

        // The server reported in-band and finished cleanly.
        server_task.await.unwrap().unwrap();
        assert!(matches!(client_err, ScpError::Peer(_)));
    }

    #[tokio::test]
    async fn multiple_targets_arrive_in_order() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let one = src.path().join("one.txt");
        let two = src.path().join("two.txt");
        std::fs::write(&one, b"first").unwrap();
        std::fs::write(&two, b"second").unwrap();

        run_pair(
            local_source(vec![one, two], false),
            local_sink(out.path(), false, Side::Client),
        )
        .await
        .unwrap();

        assert_eq!(std::fs::read(out.path().join("one.txt")).unwrap(), b"first");
        assert_eq!(std::fs::read(out.path().join("two.txt")).unwrap(), b"second");
    }
}
