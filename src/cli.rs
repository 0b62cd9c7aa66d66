use crate::store::TreasureFilter;
use clap::{Parser, Subcommand};
use diecast_scan_common::Condition;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "diecast-scan")]
#[command(about = "ミニカーのパッケージ写真から車種情報を読み取るツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 写真を読み取ってレコードを解決
    Scan {
        /// 画像ファイル（指定順にOCR結果を連結）
        images: Vec<PathBuf>,

        /// 画像フォルダ（直下の画像をファイル名順で追加）
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// 参照カタログJSON（省略時は設定値または同梱データ）
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// 抽出ルールJSON（プリセットにマージ）
        #[arg(long)]
        rules: Option<PathBuf>,

        /// 抽出ルールのプリセット (hotwheels/generic)
        #[arg(long)]
        preset: Option<String>,

        /// 解決結果をJSONで保存
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 対話確認をスキップ
        #[arg(long)]
        no_review: bool,

        /// コレクションに保存
        #[arg(long)]
        save: bool,

        /// OCRキャッシュを使用
        #[arg(long)]
        use_cache: bool,

        /// OCR言語（省略時は設定値）
        #[arg(short, long)]
        language: Option<String>,
    },

    /// OCRテキストから候補値を抽出（`-` で標準入力）
    Extract {
        #[arg(required = true)]
        input: PathBuf,

        /// 参照カタログJSON
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// 抽出ルールJSON
        #[arg(long)]
        rules: Option<PathBuf>,

        /// 抽出ルールのプリセット (hotwheels/generic)
        #[arg(long)]
        preset: Option<String>,
    },

    /// 識別コード（UPC/EAN）で検索
    Lookup {
        #[arg(required = true)]
        code: String,

        /// 参照カタログJSON
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// ローカルデータのみ（外部APIを呼ばない）
        #[arg(long)]
        offline: bool,
    },

    /// コレクション一覧
    Garage {
        /// 車名・ブランド・シリーズで検索
        #[arg(short, long)]
        search: Option<String>,

        /// ブランドで絞り込み
        #[arg(short, long)]
        brand: Option<String>,

        /// 状態で絞り込み (sealed/loose/damaged)
        #[arg(short, long)]
        condition: Option<Condition>,

        /// トレジャーハントで絞り込み (th/sth)
        #[arg(short, long)]
        treasure: Option<TreasureFilter>,

        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// コレクション統計
    Stats,

    /// 年別車両APIから参照カタログを作成
    ImportCatalog {
        /// 開始年
        #[arg(long, default_value = "2010")]
        from: i32,

        /// 終了年
        #[arg(long, default_value = "2020")]
        to: i32,

        /// 出力JSONファイル
        #[arg(short, long, default_value = "hotwheels_lookup.json")]
        output: PathBuf,
    },

    /// 設定を表示/編集
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// OCR言語を設定
        #[arg(long)]
        set_language: Option<String>,

        /// 識別コード検索APIを設定
        #[arg(long)]
        set_lookup_endpoint: Option<String>,

        /// 参照カタログを設定
        #[arg(long)]
        set_catalog: Option<PathBuf>,

        /// 抽出ルールを設定
        #[arg(long)]
        set_rules: Option<PathBuf>,

        /// 抽出ルールのプリセットを設定 (hotwheels/generic)
        #[arg(long)]
        set_preset: Option<String>,

        /// コレクター名を設定
        #[arg(long)]
        set_collector: Option<String>,
    },

    /// OCRキャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },
}
