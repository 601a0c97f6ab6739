//! 最小的 HTTP/1.1 前端：每个连接一个请求，`/@crosswind/events` 保持为 SSE 流

use std::io;

use crosswind_core::{CrosswindConfig, EnvSnapshot};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};

use crate::error::DevServerError;
use crate::response::{DevResponse, ReloadNotice};
use crate::server::{DevServer, EVENTS_PATH};
use crate::watch::watch_project;

/// 请求头上限，超过视为异常请求
const MAX_HEADER_LINES: usize = 100;

pub async fn bind(host: &str, port: u16) -> Result<TcpListener, DevServerError> {
    TcpListener::bind((host, port))
        .await
        .map_err(|source| DevServerError::Bind {
            addr: format!("{}:{}", host, port),
            source,
        })
}

/// 接受连接直到监听出错
pub async fn serve(server: DevServer, listener: TcpListener) -> Result<(), DevServerError> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let server = server.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(server, stream).await {
                tracing::debug!("connection from {} closed: {}", peer, err);
            }
        });
    }
}

/// 启动开发服务器：监听文件变更、处理请求，Ctrl+C 退出
pub async fn run(config: CrosswindConfig, env: EnvSnapshot) -> Result<(), DevServerError> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let server = DevServer::new(config, env)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (_watcher, diagnostics) = watch_project(server.root(), tx);
    for diagnostic in diagnostics {
        server.record(diagnostic);
    }

    // 每个事件独立处理，不相关的失效互不等待
    let invalidator = server.clone();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let server = invalidator.clone();
            tokio::task::spawn_blocking(move || server.apply_event(event));
        }
    });

    let listener = bind(&host, port).await?;
    tracing::info!("dev server listening on http://{}", listener.local_addr()?);

    tokio::select! {
        result = serve(server, listener) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    }
}

async fn handle_connection(server: DevServer, stream: TcpStream) -> io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).await? == 0 {
        return Ok(());
    }
    // 请求头不影响处理，读掉即可
    for _ in 0..MAX_HEADER_LINES {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 || line.trim().is_empty() {
            break;
        }
    }

    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return write_response(&mut writer, &DevResponse::status(400, "bad request"), false)
            .await;
    };
    let head_only = method == "HEAD";
    if method != "GET" && !head_only {
        return write_response(
            &mut writer,
            &DevResponse::status(405, "method not allowed"),
            false,
        )
        .await;
    }

    if target == EVENTS_PATH {
        return stream_events(server.subscribe(), &mut writer).await;
    }

    let target = target.to_string();
    tracing::debug!("{} {}", method, target);
    let response = tokio::task::spawn_blocking(move || server.request(&target))
        .await
        .unwrap_or_else(|err| DevResponse::error(err.to_string()));
    write_response(&mut writer, &response, head_only).await
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &DevResponse,
    head_only: bool,
) -> io::Result<()> {
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n",
        response.status,
        response.reason(),
        response.content_type,
        response.body.len()
    );
    writer.write_all(head.as_bytes()).await?;
    if !head_only {
        writer.write_all(&response.body).await?;
    }
    writer.flush().await
}

/// 订阅在写出响应头之前完成，客户端读到首个注释行后即不会漏掉推送
async fn stream_events<W: AsyncWrite + Unpin>(
    mut events: broadcast::Receiver<ReloadNotice>,
    writer: &mut W,
) -> io::Result<()> {
    writer
        .write_all(
            b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\nConnection: keep-alive\r\n\r\n: connected\n\n",
        )
        .await?;
    writer.flush().await?;

    loop {
        match events.recv().await {
            Ok(notice) => {
                writer
                    .write_all(format!("data: {}\n\n", notice.to_json()).as_bytes())
                    .await?;
                writer.flush().await?;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!("event stream lagged, skipped {} notices", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => return Ok(()),
        }
    }
}
